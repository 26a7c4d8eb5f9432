//! Installation error types.

use transplant_helper::HelperError;
use transplant_shell::ShellError;
use transplant_types::GrantedType;

/// Errors produced by an installation.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// A previously granted access path is no longer valid.
    #[error("access to the game folder was lost, grant it again")]
    PermissionLost,

    #[error("timed out waiting for the helper service")]
    Timeout,

    #[error("`{step}` failed with exit code {exit_code}")]
    ShellFailure { step: &'static str, exit_code: i32 },

    #[error("could not create directory {0}")]
    DirectoryCreateFailure(String),

    #[error("could not create file {0}")]
    FileCreateFailure(String),

    #[error("I/O error: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,

    #[error("another installation is already running")]
    Busy,

    #[error("{0} is not configured")]
    Unavailable(GrantedType),

    #[error("helper service error: {0}")]
    Helper(HelperError),
}

impl InstallError {
    /// Whether the installation was stopped by the user rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, InstallError::Cancelled)
    }
}

impl From<HelperError> for InstallError {
    fn from(e: HelperError) -> Self {
        match e {
            HelperError::Timeout => InstallError::Timeout,
            HelperError::PermissionDenied => InstallError::PermissionLost,
            other => InstallError::Helper(other),
        }
    }
}

impl From<ShellError> for InstallError {
    fn from(e: ShellError) -> Self {
        match e {
            ShellError::Spawn { source, .. } => InstallError::IoFailure(source),
            ShellError::Denied { exit_code } => InstallError::ShellFailure {
                step: "id",
                exit_code,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_errors_map_onto_taxonomy() {
        assert!(matches!(
            InstallError::from(HelperError::Timeout),
            InstallError::Timeout
        ));
        assert!(matches!(
            InstallError::from(HelperError::PermissionDenied),
            InstallError::PermissionLost
        ));
        assert!(matches!(
            InstallError::from(HelperError::Bind("dead".into())),
            InstallError::Helper(HelperError::Bind(_))
        ));
    }

    #[test]
    fn refused_root_is_a_shell_failure() {
        let err = InstallError::from(ShellError::Denied { exit_code: 1 });
        assert_eq!(err.to_string(), "`id` failed with exit code 1");
        assert!(!err.is_cancelled());
        assert!(InstallError::Cancelled.is_cancelled());
    }
}
