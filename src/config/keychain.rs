//! Keychain Integration
//!
//! Stores the SSH password in the system keychain so it never lands in
//! the state file. Uses the `keyring` crate for cross-platform access.

use keyring::Entry;
use uuid::Uuid;

/// Service name for keychain entries
const SERVICE_NAME: &str = "com.mediasweep.ssh";

#[derive(Debug, thiserror::Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Secret not found for ID: {0}")]
    NotFound(String),
}

impl serde::Serialize for KeychainError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub struct Keychain {
    service: String,
}

impl Keychain {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Create with custom service name (for testing)
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn generate_id() -> String {
        format!("mediasweep-{}", Uuid::new_v4())
    }

    // Account is prefixed with the OS user so the identity is stable on macOS.
    fn entry(&self, id: &str) -> Result<Entry, KeychainError> {
        Ok(Entry::new(
            &self.service,
            &format!("{}@{}", whoami::username(), id),
        )?)
    }

    /// Store (or overwrite) a secret under `id`
    pub fn store(&self, id: &str, secret: &str) -> Result<(), KeychainError> {
        tracing::info!("Keychain store: service={}, id={}", self.service, id);
        self.entry(id)?.set_password(secret).map_err(|e| {
            tracing::error!("Keychain store failed: id={}, error={:?}", id, e);
            KeychainError::Keyring(e)
        })
    }

    /// Store a new secret and return its generated ID
    pub fn store_new(&self, secret: &str) -> Result<String, KeychainError> {
        let id = Self::generate_id();
        self.store(&id, secret)?;
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<String, KeychainError> {
        match self.entry(id)?.get_password() {
            Ok(secret) => Ok(secret),
            Err(keyring::Error::NoEntry) => {
                tracing::warn!("Keychain get: no entry for id={}", id);
                Err(KeychainError::NotFound(id.to_string()))
            }
            Err(e) => Err(KeychainError::Keyring(e)),
        }
    }

    /// Delete a secret; an absent entry counts as deleted
    pub fn delete(&self, id: &str) -> Result<(), KeychainError> {
        match self.entry(id)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::Keyring(e)),
        }
    }
}

impl Default for Keychain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Touches the real system keychain
    #[test]
    #[ignore] // Run manually: cargo test keychain -- --ignored
    fn test_keychain_operations() {
        let keychain = Keychain::with_service("com.mediasweep.test");
        let id = keychain.store_new("test-secret").unwrap();
        assert_eq!(keychain.get(&id).unwrap(), "test-secret");

        keychain.store(&id, "new-secret").unwrap();
        assert_eq!(keychain.get(&id).unwrap(), "new-secret");

        keychain.delete(&id).unwrap();
        assert!(matches!(keychain.get(&id), Err(KeychainError::NotFound(_))));
        keychain.delete(&id).unwrap();
    }

    #[test]
    fn test_generate_id() {
        let id1 = Keychain::generate_id();
        let id2 = Keychain::generate_id();

        assert!(id1.starts_with("mediasweep-"));
        assert_ne!(id1, id2);
    }
}
