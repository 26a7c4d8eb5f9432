//! Device facts the probe depends on.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Read-only view of OS version and storage permission state.
///
/// Methods may block.
pub trait Platform: Send + Sync {
    /// Android SDK level.
    fn sdk_int(&self) -> u32;

    /// Whether the classic storage permission is granted.
    fn legacy_storage_granted(&self) -> bool;

    /// Whether `path` can be listed by this process.
    fn path_accessible(&self, path: &Path) -> bool;
}

/// Platform backed by `getprop` and the local filesystem.
#[derive(Debug, Clone)]
pub struct SystemPlatform {
    sdk: u32,
    storage_root: PathBuf,
}

impl SystemPlatform {
    /// Builds a platform with a known SDK level.
    pub fn new(sdk: u32, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            sdk,
            storage_root: storage_root.into(),
        }
    }

    /// Reads the SDK level from `getprop ro.build.version.sdk`.
    ///
    /// Falls back to `fallback_sdk` when not running on Android.
    pub async fn detect(storage_root: impl Into<PathBuf>, fallback_sdk: u32) -> Self {
        let sdk = match tokio::process::Command::new("getprop")
            .arg("ro.build.version.sdk")
            .output()
            .await
        {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
                .trim()
                .parse()
                .unwrap_or_else(|_| {
                    warn!("unparseable SDK level from getprop, using {fallback_sdk}");
                    fallback_sdk
                }),
            _ => {
                debug!("getprop unavailable, using SDK {fallback_sdk}");
                fallback_sdk
            }
        };
        Self::new(sdk, storage_root)
    }
}

impl Platform for SystemPlatform {
    fn sdk_int(&self) -> u32 {
        self.sdk
    }

    fn legacy_storage_granted(&self) -> bool {
        std::fs::metadata(&self.storage_root)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }

    fn path_accessible(&self, path: &Path) -> bool {
        std::fs::read_dir(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_root_counts_as_granted() {
        let tmp = tempfile::tempdir().unwrap();
        let platform = SystemPlatform::new(29, tmp.path());
        assert!(platform.legacy_storage_granted());
        assert!(platform.path_accessible(tmp.path()));
    }

    #[test]
    fn missing_root_is_not_granted() {
        let platform = SystemPlatform::new(29, "/nonexistent/storage/root");
        assert!(!platform.legacy_storage_granted());
        assert!(!platform.path_accessible(Path::new("/nonexistent/storage/root")));
    }

    #[tokio::test]
    async fn detect_falls_back_off_device() {
        let tmp = tempfile::tempdir().unwrap();
        let platform = SystemPlatform::detect(tmp.path(), 33).await;
        // On a real device getprop reports its own level; elsewhere the fallback wins.
        assert!(platform.sdk_int() > 0);
    }
}
