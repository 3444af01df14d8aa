//! SSH Client implementation using russh

use std::net::ToSocketAddrs;
use std::sync::Arc;

use russh::client::{self, Handle};
use russh::keys::key::PrivateKeyWithHashAlg;
use russh::keys::PublicKey;
use tracing::{debug, info, warn};

use super::config::{AuthMethod, SshConfig, KEEPALIVE_INTERVAL};
use super::error::SshError;
use super::known_hosts::{HostKeyVerification, KnownHostsStore};

pub struct SshClient {
    config: SshConfig,
    known_hosts: Arc<KnownHostsStore>,
}

impl SshClient {
    pub fn new(config: SshConfig, known_hosts: Arc<KnownHostsStore>) -> Self {
        Self {
            config,
            known_hosts,
        }
    }

    /// Connect and authenticate, returning the raw russh handle.
    ///
    /// Unreachable hosts and timeouts surface as `ConnectionFailed`/`Timeout`;
    /// rejected credentials, unreadable keys and host key problems as the
    /// auth-class variants (see [`SshError::is_auth_failure`]).
    pub async fn connect(self) -> Result<Handle<ClientHandler>, SshError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Connecting to SSH server at {}", addr);

        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| SshError::ConnectionFailed(format!("Failed to resolve address: {}", e)))?
            .next()
            .ok_or_else(|| SshError::ConnectionFailed("No address found".to_string()))?;

        let ssh_config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            keepalive_max: 3,
            ..Default::default()
        };

        let handler = ClientHandler {
            host: self.config.host.clone(),
            port: self.config.port,
            strict: self.config.strict_host_key_checking,
            known_hosts: self.known_hosts.clone(),
        };

        let mut handle = tokio::time::timeout(
            self.config.timeout(),
            client::connect(Arc::new(ssh_config), socket_addr, handler),
        )
        .await
        .map_err(|_| SshError::Timeout(format!("Connection to {} timed out", addr)))?
        .map_err(|e| match e {
            e @ (SshError::HostKeyMismatch { .. } | SshError::HostKeyUnknown { .. }) => e,
            other => SshError::ConnectionFailed(other.to_string()),
        })?;

        debug!("SSH handshake completed");

        let authenticated = match &self.config.auth {
            AuthMethod::Password { password } => handle
                .authenticate_password(&self.config.username, password)
                .await
                .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?,
            AuthMethod::Key {
                key_path,
                passphrase,
            } => {
                let key = russh::keys::load_secret_key(key_path, passphrase.as_deref())
                    .map_err(|e| SshError::KeyError(format!("{}: {}", key_path, e)))?;
                let key_with_hash = PrivateKeyWithHashAlg::new(Arc::new(key), None);

                handle
                    .authenticate_publickey(&self.config.username, key_with_hash)
                    .await
                    .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?
            }
        };

        if !authenticated.success() {
            return Err(SshError::AuthenticationFailed(
                "Authentication rejected by server".to_string(),
            ));
        }

        info!("SSH authentication successful as {}", self.config.username);
        Ok(handle)
    }
}

/// Client handler for russh callbacks; only host key verification is used.
pub struct ClientHandler {
    host: String,
    port: u16,
    strict: bool,
    known_hosts: Arc<KnownHostsStore>,
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self
            .known_hosts
            .verify(&self.host, self.port, server_public_key)
        {
            HostKeyVerification::Verified => {
                info!("Host key verified for {}:{}", self.host, self.port);
                Ok(true)
            }
            HostKeyVerification::Unknown { fingerprint } if self.strict => {
                warn!(
                    "Unknown host key for {}:{} ({}), strict mode rejects it",
                    self.host, self.port, fingerprint
                );
                Err(SshError::HostKeyUnknown {
                    host: self.host.clone(),
                    fingerprint,
                })
            }
            HostKeyVerification::Unknown { fingerprint } => {
                info!(
                    "New host {}:{}, recording key {}",
                    self.host, self.port, fingerprint
                );
                if let Err(e) = self
                    .known_hosts
                    .add_host(&self.host, self.port, server_public_key)
                {
                    warn!("Failed to save host key: {}", e);
                }
                Ok(true)
            }
            HostKeyVerification::Changed {
                expected_fingerprint,
                actual_fingerprint,
            } => Err(SshError::HostKeyMismatch {
                host: format!("{}:{}", self.host, self.port),
                expected: expected_fingerprint,
                actual: actual_fingerprint,
            }),
        }
    }
}
