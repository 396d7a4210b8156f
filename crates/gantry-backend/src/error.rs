//! Backend error types.

use thiserror::Error;

/// Error surface shared by all backend plugins.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No configuration exists for the mount.
    #[error("no configuration for mount '{0}'")]
    ConfigMissing(String),

    /// A configuration field is missing, empty, or the wrong type.
    #[error("invalid mount configuration: {0}")]
    ConfigInvalid(String),

    /// Neither a password nor a usable key agent was available.
    #[error("no authentication method provided (set password or use_ssh_agent)")]
    NoAuthMethod,

    /// Transport connect, handshake, or authentication failed.
    #[error("transport dial failed: {0}")]
    Dial(String),

    /// The file-transfer subsystem could not be negotiated.
    #[error("protocol negotiation failed: {0}")]
    Protocol(String),

    /// The remote reported that a path does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other error reported by the remote, message passed through.
    #[error("{0}")]
    Remote(String),

    /// Operation attempted while the backend has no live connection.
    #[error("backend is not connected")]
    NotConnected,
}

impl BackendError {
    /// Create a ConfigMissing error.
    pub fn config_missing(mount: impl Into<String>) -> Self {
        Self::ConfigMissing(mount.into())
    }

    /// Create a ConfigInvalid error.
    pub fn config_invalid(reason: impl Into<String>) -> Self {
        Self::ConfigInvalid(reason.into())
    }

    /// Create a Dial error.
    pub fn dial(reason: impl Into<String>) -> Self {
        Self::Dial(reason.into())
    }

    /// Create a Protocol error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol(reason.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a Remote error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}

/// Backend result type.
pub type BackendResult<T> = Result<T, BackendError>;
