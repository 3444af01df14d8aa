//! Persisted application state

use serde::{Deserialize, Serialize};

use crate::media::DisplayFlags;
use crate::ssh::{AuthMethod, SshConfig};

/// Current config format version
pub const CONFIG_VERSION: u32 = 1;

pub const DEFAULT_ORIGINALS_ROOT: &str = "/opt/photoprism/originals";
pub const DEFAULT_CACHE_ROOT: &str = "/opt/photoprism/storage/cache/thumbnails";
pub const DEFAULT_IMPORT_ROOT: &str = "/opt/photoprism/import";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    #[default]
    Password,
    Key,
}

/// Everything needed to resume a review after a restart.
///
/// The password itself is never stored here; see `password_keychain_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub version: u32,

    pub host: String,
    pub port: u16,
    pub username: String,
    pub credential_mode: CredentialMode,
    pub key_path: Option<String>,
    /// Keychain entry holding the password
    pub password_keychain_id: Option<String>,

    pub originals_root: String,
    pub cache_root: String,
    pub import_root: String,

    pub show_images: bool,
    pub show_videos: bool,

    pub last_index: usize,
    pub pending_deletes: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            host: String::new(),
            port: 22,
            username: String::new(),
            credential_mode: CredentialMode::default(),
            key_path: None,
            password_keychain_id: None,
            originals_root: DEFAULT_ORIGINALS_ROOT.to_string(),
            cache_root: DEFAULT_CACHE_ROOT.to_string(),
            import_root: DEFAULT_IMPORT_ROOT.to_string(),
            show_images: true,
            show_videos: true,
            last_index: 0,
            pending_deletes: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn display_flags(&self) -> DisplayFlags {
        DisplayFlags {
            show_images: self.show_images,
            show_videos: self.show_videos,
        }
    }

    pub fn set_display_flags(&mut self, flags: DisplayFlags) {
        self.show_images = flags.show_images;
        self.show_videos = flags.show_videos;
    }

    /// True once a host and user have been entered
    pub fn has_connection(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty()
    }

    /// Build connection parameters. `secret` is the password in password
    /// mode and the key passphrase (if any) in key mode.
    pub fn ssh_config(&self, secret: Option<String>) -> SshConfig {
        let auth = match self.credential_mode {
            CredentialMode::Password => AuthMethod::password(secret.unwrap_or_default()),
            CredentialMode::Key => {
                AuthMethod::key(self.key_path.clone().unwrap_or_default(), secret)
            }
        };
        SshConfig::new(&self.host, self.port, &self.username, auth)
    }
}
