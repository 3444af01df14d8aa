//! Preview fetching
//!
//! Images are small enough to show from memory. Videos go to a temp file
//! for an external player; only one such file exists at a time.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::remote::RemoteFs;
use crate::sftp::path_utils::remote_extension;

/// Read a whole remote file into memory
pub async fn fetch_bytes(fs: &dyn RemoteFs, remote_path: &str) -> EngineResult<Vec<u8>> {
    let bytes = fs.read_file(remote_path).await?;
    debug!("Fetched {} ({} bytes)", remote_path, bytes.len());
    Ok(bytes)
}

/// Single-slot temp file owner. Fetching a new preview deletes the previous
/// file first; clearing or dropping deletes the current one.
pub struct TempPreview {
    dir: PathBuf,
    current: Mutex<Option<PathBuf>>,
}

impl TempPreview {
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: Mutex::new(None),
        }
    }

    /// Path of the file currently held, if any
    pub fn current(&self) -> Option<PathBuf> {
        self.current.lock().clone()
    }

    /// Download `remote_path` to a fresh `msw_<uuid>.<ext>` file
    pub async fn fetch(&self, fs: &dyn RemoteFs, remote_path: &str) -> EngineResult<PathBuf> {
        self.clear();

        let ext = remote_extension(remote_path).unwrap_or_else(|| "bin".to_string());
        let local = self.dir.join(format!("msw_{}.{}", Uuid::new_v4(), ext));

        if let Err(e) = fs.download(remote_path, &local).await {
            remove_quietly(&local);
            return Err(e);
        }
        if !local.exists() {
            return Err(EngineError::Remote(format!(
                "Preview of {} produced no file",
                remote_path
            )));
        }

        *self.current.lock() = Some(local.clone());
        Ok(local)
    }

    /// Delete the held file, if any
    pub fn clear(&self) {
        if let Some(path) = self.current.lock().take() {
            remove_quietly(&path);
        }
    }
}

impl Default for TempPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempPreview {
    fn drop(&mut self) {
        self.clear();
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed preview {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove preview {:?}: {}", path, e),
    }
}
