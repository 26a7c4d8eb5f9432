//! Helper error types.

/// Errors produced while binding to or calling the privileged helper.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HelperError {
    #[error("timed out waiting for the helper service")]
    Timeout,

    #[error("helper permission not granted")]
    PermissionDenied,

    #[error("helper bind failed: {0}")]
    Bind(String),

    #[error("helper service disconnected")]
    Disconnected,

    #[error("helper call failed: {0}")]
    Remote(String),
}
