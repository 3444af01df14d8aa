//! Configuration Management Module
//!
//! Persistent review state (connection, folders, display flags, position,
//! pending deletes) and keychain storage for the password.

pub mod keychain;
pub mod storage;
pub mod types;

pub use keychain::{Keychain, KeychainError};
pub use storage::{config_dir, config_file, ConfigStorage, StorageError};
pub use types::{AppConfig, CredentialMode, CONFIG_VERSION};
