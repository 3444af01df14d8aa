//! Configuration Storage
//!
//! Handles reading/writing the state file to disk.
//! Config location: ~/.mediasweep on macOS/Linux, %APPDATA%\MediaSweep on Windows

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::types::{AppConfig, CONFIG_VERSION};

/// Configuration storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

impl serde::Serialize for StorageError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Get the MediaSweep configuration directory
/// Returns %APPDATA%\MediaSweep on Windows, ~/.mediasweep on macOS/Linux
pub fn config_dir() -> Result<PathBuf, StorageError> {
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("MediaSweep"));
        }
        dirs::home_dir()
            .map(|home| home.join(".mediasweep"))
            .ok_or(StorageError::NoConfigDir)
    }

    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|home| home.join(".mediasweep"))
            .ok_or(StorageError::NoConfigDir)
    }
}

/// Get the state file path
pub fn config_file() -> Result<PathBuf, StorageError> {
    Ok(config_dir()?.join("config.json"))
}

/// Loads and saves [`AppConfig`]
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Create a new storage manager with default path
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            path: config_file()?,
        })
    }

    /// Create storage manager with custom path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Load state from disk.
    /// A missing file yields defaults. An unreadable, corrupted or
    /// newer-version file is backed up and defaults are returned, so
    /// startup never fails here.
    pub async fn load(&self) -> Result<AppConfig, StorageError> {
        match self.read().await {
            Ok(Some(config)) => Ok(config),
            Ok(None) => {
                tracing::debug!("No config at {:?}, using defaults", self.path);
                Ok(AppConfig::default())
            }
            Err(e) => {
                tracing::warn!("Config file unusable: {}", e);
                match self.backup().await {
                    Ok(backup_path) => tracing::warn!(
                        "Unusable config backed up to {:?}, using defaults",
                        backup_path
                    ),
                    Err(backup_err) => {
                        tracing::error!("Failed to backup unusable config: {}", backup_err)
                    }
                }
                Ok(AppConfig::default())
            }
        }
    }

    /// `None` when the file does not exist
    async fn read(&self) -> Result<Option<AppConfig>, StorageError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let config = serde_json::from_slice::<AppConfig>(&bytes)?;
        if config.version > CONFIG_VERSION {
            return Err(StorageError::VersionTooNew {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(Some(config))
    }

    /// Save state to disk (temp file, fsync, rename)
    pub async fn save(&self, config: &AppConfig) -> Result<(), StorageError> {
        self.ensure_dir().await?;

        let temp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(config)?;

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;
        tracing::debug!(
            "Saved config: index={}, pending={}",
            config.last_index,
            config.pending_deletes.len()
        );

        Ok(())
    }

    /// Delete the state file. Missing file is not an error.
    pub async fn erase(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("Erased config {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Check if the state file exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the current file aside with a timestamp suffix
    pub async fn backup(&self) -> Result<PathBuf, StorageError> {
        let backup_path = self.path.with_extension(format!(
            "json.backup.{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));

        if self.exists().await {
            fs::copy(&self.path, &backup_path).await?;
        }

        Ok(backup_path)
    }
}
