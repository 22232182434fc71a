//! Shared error type across wsBridge crates.

use thiserror::Error;

/// Stable error codes (safe to log and match on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No native socket capability in this execution context.
    EnvironmentUnavailable,
    /// Native socket reported an error.
    Transport,
    /// Resource-management collaborator rejected the call.
    Remote,
    /// Frame payload could not be decoded.
    Decode,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::EnvironmentUnavailable => "ENVIRONMENT_UNAVAILABLE",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Remote => "REMOTE",
            ErrorCode::Decode => "DECODE",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WsBridgeError>;

/// Error reported by a native socket. Delivered through the `error` event and
/// never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap any displayable native error.
    pub fn from_native(err: &dyn std::fmt::Display) -> Self {
        Self::new(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure returned by the resource-management collaborator during
/// `delete`/`edit`. Passed through without translation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote operation failed{}: {message}", status_suffix(.status))]
pub struct RemoteOperationError {
    /// HTTP-like status, when the collaborator knows one.
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteOperationError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum WsBridgeError {
    #[error("environment unavailable: {0}")]
    EnvironmentUnavailable(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Remote(#[from] RemoteOperationError),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl WsBridgeError {
    /// Map to a stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            WsBridgeError::EnvironmentUnavailable(_) => ErrorCode::EnvironmentUnavailable,
            WsBridgeError::Transport(_) => ErrorCode::Transport,
            WsBridgeError::Remote(_) => ErrorCode::Remote,
            WsBridgeError::Decode(_) => ErrorCode::Decode,
            WsBridgeError::BadConfig(_) => ErrorCode::BadConfig,
            WsBridgeError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            WsBridgeError::Internal(_) => ErrorCode::Internal,
        }
    }
}
