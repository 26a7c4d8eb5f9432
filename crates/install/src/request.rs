//! Installation request and options.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use transplant_helper::DEFAULT_CONNECT_TIMEOUT;
use transplant_types::GrantedType;
use uuid::Uuid;

use crate::error::InstallError;

/// Size of the buffer used for byte copies.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// One installation, immutable once dispatched.
#[derive(Debug, Clone)]
pub struct InstallationRequest {
    pub id: Uuid,
    /// Already downloaded local file.
    pub source_path: PathBuf,
    /// Name of the file inside the translations directory.
    pub file_name: String,
    pub granted_type: GrantedType,
}

impl InstallationRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        granted_type: GrantedType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path: source_path.into(),
            file_name: file_name.into(),
            granted_type,
        }
    }

    /// Rejects file names that would escape the translations directory.
    pub fn validate(&self) -> Result<(), InstallError> {
        let name = self.file_name.as_str();
        let single_component = Path::new(name).file_name().is_some_and(|n| n == name);
        if name.is_empty() || !single_component || name.contains('/') {
            return Err(InstallError::IoFailure(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file name {name:?}"),
            )));
        }
        Ok(())
    }
}

/// Library-level installation knobs.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Bound on waiting for the helper bind to settle.
    pub helper_timeout: Duration,
    pub chunk_size: usize,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            helper_timeout: DEFAULT_CONNECT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
