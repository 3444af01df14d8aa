//! SFTP Session
//!
//! Provides SFTP file operations over an existing SSH connection.

use std::path::Path;

use russh_sftp::client::error::Error as SftpErrorInner;
use russh_sftp::client::SftpSession as RusshSftpSession;
use russh_sftp::protocol::FileAttributes;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::error::SftpError;
use super::path_utils::join_remote_path;
use super::types::{FileInfo, FileType};
use crate::ssh::HandleController;

pub struct SftpSession {
    sftp: RusshSftpSession,
}

impl SftpSession {
    /// Open the SFTP subsystem on a fresh session channel
    pub async fn open(controller: &HandleController) -> Result<Self, SftpError> {
        let channel = controller
            .open_session_channel()
            .await
            .map_err(|e| SftpError::ChannelError(e.to_string()))?;

        channel.request_subsystem(true, "sftp").await.map_err(|e| {
            SftpError::SubsystemNotAvailable(format!("Failed to request SFTP subsystem: {}", e))
        })?;

        let sftp = RusshSftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SftpError::SubsystemNotAvailable(e.to_string()))?;

        info!("SFTP subsystem opened");
        Ok(Self { sftp })
    }

    /// List a directory in server order, without `.` and `..`
    pub async fn list_dir(&self, path: &str) -> Result<Vec<FileInfo>, SftpError> {
        debug!("Listing directory: {}", path);

        let read_dir = self
            .sftp
            .read_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;

        let entries: Vec<FileInfo> = read_dir
            .filter(|entry| {
                let name = entry.file_name();
                name != "." && name != ".."
            })
            .map(|entry| {
                let name = entry.file_name();
                let full_path = join_remote_path(path, &name);
                file_info(name, full_path, &entry.metadata())
            })
            .collect();

        debug!("Listed {} entries in {}", entries.len(), path);
        Ok(entries)
    }

    pub async fn exists(&self, path: &str) -> Result<bool, SftpError> {
        self.sftp
            .try_exists(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    /// Read a whole remote file into memory
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, SftpError> {
        self.sftp
            .read(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    /// Stream a remote file to a local path, replacing it. Returns bytes copied.
    pub async fn download(&self, remote_path: &str, local_path: &Path) -> Result<u64, SftpError> {
        let mut remote_file = self
            .sftp
            .open(remote_path)
            .await
            .map_err(|e| map_sftp_error(e, remote_path))?;
        let mut local_file = tokio::fs::File::create(local_path).await?;

        let copied = tokio::io::copy(&mut remote_file, &mut local_file)
            .await
            .map_err(|e| SftpError::TransferError(format!("{}: {}", remote_path, e)))?;
        local_file.sync_all().await?;

        info!("Downloaded {} ({} bytes) to {:?}", remote_path, copied, local_path);
        Ok(copied)
    }

    /// Stream a local file to a remote path, creating or truncating it.
    pub async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<u64, SftpError> {
        let mut local_file = tokio::fs::File::open(local_path).await?;
        let mut remote_file = self
            .sftp
            .create(remote_path)
            .await
            .map_err(|e| map_sftp_error(e, remote_path))?;

        let copied = tokio::io::copy(&mut local_file, &mut remote_file)
            .await
            .map_err(|e| SftpError::TransferError(format!("{}: {}", remote_path, e)))?;
        remote_file
            .shutdown()
            .await
            .map_err(|e| SftpError::TransferError(format!("{}: {}", remote_path, e)))?;

        info!("Uploaded {:?} ({} bytes) to {}", local_path, copied, remote_path);
        Ok(copied)
    }

    pub async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
        self.sftp
            .remove_file(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    pub async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
        self.sftp
            .remove_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    pub async fn close(&self) -> Result<(), SftpError> {
        self.sftp
            .close()
            .await
            .map_err(|e| SftpError::ProtocolError(e.to_string()))
    }
}

fn file_info(name: String, path: String, metadata: &FileAttributes) -> FileInfo {
    let file_type = if metadata.is_dir() {
        FileType::Directory
    } else if metadata.is_symlink() {
        FileType::Symlink
    } else if metadata.is_regular() {
        FileType::File
    } else {
        FileType::Unknown
    };

    FileInfo {
        name,
        path,
        file_type,
    }
}

/// Map SFTP errors to our error type
fn map_sftp_error(err: SftpErrorInner, path: &str) -> SftpError {
    let err_str = err.to_string();
    if err_str.contains("No such file") || err_str.contains("not found") {
        SftpError::FileNotFound(path.to_string())
    } else if err_str.contains("Permission denied") {
        SftpError::PermissionDenied(path.to_string())
    } else if err_str.contains("Not a directory") {
        SftpError::NotADirectory(path.to_string())
    } else {
        SftpError::ProtocolError(err_str)
    }
}
