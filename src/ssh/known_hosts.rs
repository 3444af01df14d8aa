//! Known hosts management for SSH host key verification
//!
//! Reads OpenSSH `known_hosts` lines (plain host names only; hashed `|1|`
//! entries are ignored) and appends new hosts on first contact.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use parking_lot::RwLock;
use russh::keys::{PublicKey, PublicKeyBase64};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::error::SshError;

/// Result of host key verification
#[derive(Debug, Clone, PartialEq)]
pub enum HostKeyVerification {
    /// Key matches known_hosts entry
    Verified,
    /// Host (or this key type for the host) not seen before
    Unknown { fingerprint: String },
    /// Key changed from known_hosts entry
    Changed {
        expected_fingerprint: String,
        actual_fingerprint: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
struct HostKeyEntry {
    key_type: String,
    key_data: String,
}

pub struct KnownHostsStore {
    hosts: RwLock<HashMap<String, Vec<HostKeyEntry>>>,
    path: PathBuf,
}

impl KnownHostsStore {
    /// Open the user's `~/.ssh/known_hosts`
    pub fn open_default() -> Self {
        let path = dirs::home_dir()
            .map(|h| h.join(".ssh").join("known_hosts"))
            .unwrap_or_else(|| PathBuf::from(".ssh/known_hosts"));
        Self::with_path(path)
    }

    pub fn with_path(path: PathBuf) -> Self {
        let hosts = match fs::read_to_string(&path) {
            Ok(contents) => parse_known_hosts(&contents),
            Err(e) => {
                debug!("known_hosts not loaded from {:?}: {}", path, e);
                HashMap::new()
            }
        };
        info!("Loaded {} known hosts from {:?}", hosts.len(), path);
        Self {
            hosts: RwLock::new(hosts),
            path,
        }
    }

    pub fn verify(&self, host: &str, port: u16, key: &PublicKey) -> HostKeyVerification {
        let key_b64 = BASE64.encode(key.public_key_bytes());
        self.verify_encoded(host, port, key.algorithm().as_str(), &key_b64)
    }

    fn verify_encoded(
        &self,
        host: &str,
        port: u16,
        key_type: &str,
        key_b64: &str,
    ) -> HostKeyVerification {
        let hosts = self.hosts.read();
        let actual_fingerprint = BASE64
            .decode(key_b64)
            .map(|bytes| fingerprint_of(&bytes))
            .unwrap_or_else(|_| "unknown".to_string());

        let lookup = make_key(host, port);
        let entries = hosts
            .get(&lookup)
            .or_else(|| hosts.get(&host.to_lowercase()));

        let Some(stored) = entries.and_then(|e| e.iter().find(|e| e.key_type == key_type)) else {
            debug!("No {} key recorded for {}", key_type, lookup);
            return HostKeyVerification::Unknown {
                fingerprint: actual_fingerprint,
            };
        };

        if stored.key_data == key_b64 {
            HostKeyVerification::Verified
        } else {
            let expected_fingerprint = BASE64
                .decode(&stored.key_data)
                .map(|bytes| fingerprint_of(&bytes))
                .unwrap_or_else(|_| "unknown".to_string());
            warn!(
                "Host key for {} changed: expected {}, got {}",
                lookup, expected_fingerprint, actual_fingerprint
            );
            HostKeyVerification::Changed {
                expected_fingerprint,
                actual_fingerprint,
            }
        }
    }

    /// Record a host key in memory and append it to the file
    pub fn add_host(&self, host: &str, port: u16, key: &PublicKey) -> Result<(), SshError> {
        let key_type = key.algorithm().as_str().to_string();
        let key_b64 = BASE64.encode(key.public_key_bytes());
        let lookup = make_key(host, port);

        self.hosts
            .write()
            .entry(lookup.clone())
            .or_default()
            .push(HostKeyEntry {
                key_type: key_type.clone(),
                key_data: key_b64.clone(),
            });

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} {} {}", lookup, key_type, key_b64)?;

        info!("Added {} host key for {} to {:?}", key_type, lookup, self.path);
        Ok(())
    }
}

fn fingerprint_of(key_bytes: &[u8]) -> String {
    let hash = Sha256::digest(key_bytes);
    format!("SHA256:{}", BASE64.encode(hash).trim_end_matches('='))
}

/// Lookup key: bare host on port 22, `[host]:port` otherwise
fn make_key(host: &str, port: u16) -> String {
    let host = host.to_lowercase();
    if port == 22 {
        host
    } else {
        format!("[{}]:{}", host, port)
    }
}

fn parse_known_hosts(contents: &str) -> HashMap<String, Vec<HostKeyEntry>> {
    let mut hosts: HashMap<String, Vec<HostKeyEntry>> = HashMap::new();

    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(names), Some(key_type), Some(key_data)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        // @cert-authority / @revoked markers
        if names.starts_with('@') {
            continue;
        }

        for name in names.split(',').filter(|n| !n.starts_with('|')) {
            hosts.entry(name.to_lowercase()).or_default().push(HostKeyEntry {
                key_type: key_type.to_string(),
                key_data: key_data.to_string(),
            });
        }
    }

    hosts
}
