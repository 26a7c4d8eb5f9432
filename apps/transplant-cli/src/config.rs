//! CLI configuration.
//!
//! Read from `~/.config/transplant/config.json`. Every field is optional;
//! a missing file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use transplant_helper::DEFAULT_CONNECT_TIMEOUT;
use transplant_install::InstallOptions;
use transplant_paths::DEFAULT_STORAGE_ROOT;
use transplant_progress::{DEFAULT_CAPACITY, DEFAULT_WINDOW};
use transplant_shell::DEFAULT_SHELL_BINARY;
use transplant_types::GrantedType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Package whose data directory receives translations.
    pub package_name: String,
    pub storage_root: PathBuf,
    /// Root-granting binary.
    pub shell_binary: String,
    pub helper_timeout_secs: u64,
    pub progress_window_ms: u64,
    pub progress_capacity: usize,
    /// Mechanism used when `install` is run without `--mechanism`.
    pub preferred_mechanism: Option<GrantedType>,
    pub grant_store_path: Option<PathBuf>,
    /// SDK level assumed when `getprop` is unavailable.
    pub fallback_sdk: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            package_name: String::new(),
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            shell_binary: DEFAULT_SHELL_BINARY.into(),
            helper_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            progress_window_ms: DEFAULT_WINDOW.as_millis() as u64,
            progress_capacity: DEFAULT_CAPACITY,
            preferred_mechanism: None,
            grant_store_path: None,
            fallback_sdk: transplant_types::EXPLOIT_PATCHED_SDK,
        }
    }
}

impl CliConfig {
    /// Loads the config from `path`, or from the default location.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<CliConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn helper_timeout(&self) -> Duration {
        Duration::from_secs(self.helper_timeout_secs)
    }

    pub fn progress_window(&self) -> Duration {
        Duration::from_millis(self.progress_window_ms)
    }

    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            helper_timeout: self.helper_timeout(),
            ..InstallOptions::default()
        }
    }

    /// Location of the persisted tree grants.
    pub fn grant_store_path(&self) -> anyhow::Result<PathBuf> {
        match &self.grant_store_path {
            Some(p) => Ok(p.clone()),
            None => Ok(config_base_dir()?.join("transplant").join("grants.json")),
        }
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("transplant").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    Ok(PathBuf::from(home).join(".config"))
}
