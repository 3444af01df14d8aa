//! Engine-level error taxonomy
//!
//! Every public engine operation returns `Result<_, EngineError>`. Per-file
//! transfer and delete failures are not errors; they are itemised in the
//! commit and import reports.

use thiserror::Error;

use crate::config::{KeychainError, StorageError};
use crate::review::ReviewError;
use crate::sftp::SftpError;
use crate::ssh::SshError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Host unreachable, resolution failure or connect timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Bad credentials, unreadable key or host key rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A configured remote root (or an operation's target) does not exist
    #[error("Remote path not found: {0}")]
    Path(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Keychain error: {0}")]
    Keychain(#[from] KeychainError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    /// Anything else, carrying the underlying message
    #[error("Remote operation failed: {0}")]
    Remote(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<SshError> for EngineError {
    fn from(err: SshError) -> Self {
        if err.is_auth_failure() {
            return EngineError::Auth(err.to_string());
        }
        match err {
            SshError::ConnectionFailed(_) | SshError::Timeout(_) | SshError::IoError(_) => {
                EngineError::Network(err.to_string())
            }
            SshError::Disconnected => EngineError::NotConnected,
            other => EngineError::Remote(other.to_string()),
        }
    }
}

impl From<SftpError> for EngineError {
    fn from(err: SftpError) -> Self {
        match err {
            SftpError::FileNotFound(path) => EngineError::Path(path),
            SftpError::ChannelError(_) => EngineError::NotConnected,
            other => EngineError::Remote(other.to_string()),
        }
    }
}

impl serde::Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
