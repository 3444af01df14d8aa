//! Remote filesystem seam
//!
//! Engine components only see [`RemoteFs`]. [`RemoteSession`] is the real
//! implementation backed by one SSH connection.

use std::path::Path;

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::sftp::FileInfo;

#[cfg(test)]
pub mod memory;
mod session;

pub use session::RemoteSession;

/// Remote file operations used by catalog, commit, cache and import code.
///
/// Implementations must fail every call with `EngineError::NotConnected`
/// when no live connection exists, and must not run two calls at once.
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// Direct children of `path`, in server order, without `.`/`..`
    async fn list_dir(&self, path: &str) -> EngineResult<Vec<FileInfo>>;

    async fn exists(&self, path: &str) -> EngineResult<bool>;

    async fn read_file(&self, path: &str) -> EngineResult<Vec<u8>>;

    /// Copy a remote file to `local`, returning the byte count
    async fn download(&self, remote: &str, local: &Path) -> EngineResult<u64>;

    /// Copy `local` to a remote path, overwriting any existing file
    async fn upload(&self, local: &Path, remote: &str) -> EngineResult<u64>;

    async fn remove_file(&self, path: &str) -> EngineResult<()>;

    /// Remove an empty directory
    async fn remove_dir(&self, path: &str) -> EngineResult<()>;

    /// Drop the connection. Safe to call when already disconnected.
    async fn disconnect(&self);
}
