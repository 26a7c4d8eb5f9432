//! Root shell session.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::runner::{CommandRunner, ShellOutput};

/// Root-granting binary used when none is configured.
pub const DEFAULT_SHELL_BINARY: &str = "su";

/// Errors from the root shell.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("elevated shell refused (exit code {exit_code})")]
    Denied { exit_code: i32 },
}

/// Quotes `s` for a POSIX shell.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Quotes a path for a POSIX shell.
pub fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// Shared root shell, opened lazily on first use.
///
/// Commands run as `<binary> -c <command>`. The elevated session is verified
/// once with `id`; a refused session is not cached so a later grant works.
pub struct RootShell {
    binary: String,
    runner: Arc<dyn CommandRunner>,
    session: OnceCell<()>,
}

impl RootShell {
    /// Creates a root shell over `binary` (see [`DEFAULT_SHELL_BINARY`]).
    pub fn new(binary: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            binary: binary.into(),
            runner,
            session: OnceCell::new(),
        }
    }

    /// The configured root binary.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Whether an elevated session has been opened.
    pub fn is_open(&self) -> bool {
        self.session.initialized()
    }

    /// Looks up the root binary on `PATH`.
    ///
    /// Returns the resolved location, or `None` when it cannot be found.
    pub async fn resolve_binary(&self) -> Option<String> {
        let lookup = format!("command -v {}", quote(&self.binary));
        match self.runner.run("sh", &["-c", lookup.as_str()]).await {
            Ok(out) if out.success() => {
                let path = out.stdout.trim();
                (!path.is_empty()).then(|| path.to_string())
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "shell lookup failed");
                None
            }
        }
    }

    /// Opens the elevated session if it is not open yet.
    pub async fn ensure_session(&self) -> Result<(), ShellError> {
        self.session
            .get_or_try_init(|| async {
                let out = self.raw("id").await?;
                if !out.success() {
                    warn!(binary = %self.binary, exit_code = out.exit_code, "root shell refused");
                    return Err(ShellError::Denied {
                        exit_code: out.exit_code,
                    });
                }
                info!(binary = %self.binary, id = %out.stdout.trim(), "root shell session opened");
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Runs `command` in the elevated session.
    ///
    /// A non-zero exit code is returned as output, not as an error.
    pub async fn exec(&self, command: &str) -> Result<ShellOutput, ShellError> {
        self.ensure_session().await?;
        let out = self.raw(command).await?;
        debug!(command, exit_code = out.exit_code, "root shell command finished");
        Ok(out)
    }

    async fn raw(&self, command: &str) -> Result<ShellOutput, ShellError> {
        self.runner
            .run(&self.binary, &["-c", command])
            .await
            .map_err(|source| ShellError::Spawn {
                binary: self.binary.clone(),
                source,
            })
    }
}
