//! SFTP file operations
//!
//! Thin wrapper over the russh-sftp client: listing, metadata, streaming
//! download/upload and removal of remote files.

pub mod error;
pub mod path_utils;
pub mod session;
pub mod types;

pub use error::SftpError;
pub use session::SftpSession;
pub use types::{FileInfo, FileType};
