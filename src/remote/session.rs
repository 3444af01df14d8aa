//! The one live remote session
//!
//! Holds at most one SSH connection plus its SFTP channel. Every remote
//! call takes the session lock for its whole duration, so calls issued from
//! several tasks are executed one at a time.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use super::RemoteFs;
use crate::error::{EngineError, EngineResult};
use crate::sftp::{FileInfo, SftpSession};
use crate::ssh::{spawn_handle_owner_task, HandleController, KnownHostsStore, PingResult, SshClient, SshConfig};

struct LiveConnection {
    label: String,
    controller: HandleController,
    sftp: SftpSession,
}

pub struct RemoteSession {
    known_hosts: Arc<KnownHostsStore>,
    inner: Mutex<Option<LiveConnection>>,
}

impl RemoteSession {
    pub fn new(known_hosts: Arc<KnownHostsStore>) -> Self {
        Self {
            known_hosts,
            inner: Mutex::new(None),
        }
    }

    /// Connect, authenticate, open SFTP and check that every path in
    /// `required_roots` exists. An existing connection is torn down first.
    ///
    /// On any failure the session is left disconnected.
    pub async fn connect(&self, config: SshConfig, required_roots: &[&str]) -> EngineResult<()> {
        let mut guard = self.inner.lock().await;
        if let Some(old) = guard.take() {
            info!("Replacing existing connection to {}", old.label);
            teardown(old).await;
        }

        let label = format!("{}@{}:{}", config.username, config.host, config.port);
        let handle = SshClient::new(config, self.known_hosts.clone())
            .connect()
            .await?;
        let controller = spawn_handle_owner_task(handle, label.clone());

        let sftp = match SftpSession::open(&controller).await {
            Ok(sftp) => sftp,
            Err(e) => {
                controller.disconnect().await;
                return Err(e.into());
            }
        };
        let live = LiveConnection {
            label,
            controller,
            sftp,
        };

        for root in required_roots.iter().filter(|r| !r.is_empty()) {
            match live.sftp.exists(root).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Configured remote root {} does not exist", root);
                    teardown(live).await;
                    return Err(EngineError::Path(root.to_string()));
                }
                Err(e) => {
                    teardown(live).await;
                    return Err(e.into());
                }
            }
        }

        info!("Session established: {}", live.label);
        *guard = Some(live);
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.inner
            .lock()
            .await
            .as_ref()
            .is_some_and(|live| live.controller.is_connected())
    }

    /// Keep-alive round trip
    pub async fn ping(&self) -> EngineResult<PingResult> {
        let guard = self.inner.lock().await;
        let live = live(&guard)?;
        Ok(live.controller.ping().await)
    }
}

fn live<'a>(guard: &'a MutexGuard<'_, Option<LiveConnection>>) -> EngineResult<&'a LiveConnection> {
    match guard.as_ref() {
        Some(live) if live.controller.is_connected() => Ok(live),
        _ => Err(EngineError::NotConnected),
    }
}

async fn teardown(live: LiveConnection) {
    if let Err(e) = live.sftp.close().await {
        warn!("SFTP close failed for {}: {}", live.label, e);
    }
    live.controller.disconnect().await;
    info!("Disconnected {}", live.label);
}

#[async_trait]
impl RemoteFs for RemoteSession {
    async fn list_dir(&self, path: &str) -> EngineResult<Vec<FileInfo>> {
        let guard = self.inner.lock().await;
        Ok(live(&guard)?.sftp.list_dir(path).await?)
    }

    async fn exists(&self, path: &str) -> EngineResult<bool> {
        let guard = self.inner.lock().await;
        Ok(live(&guard)?.sftp.exists(path).await?)
    }

    async fn read_file(&self, path: &str) -> EngineResult<Vec<u8>> {
        let guard = self.inner.lock().await;
        Ok(live(&guard)?.sftp.read(path).await?)
    }

    async fn download(&self, remote: &str, local: &Path) -> EngineResult<u64> {
        let guard = self.inner.lock().await;
        Ok(live(&guard)?.sftp.download(remote, local).await?)
    }

    async fn upload(&self, local: &Path, remote: &str) -> EngineResult<u64> {
        let guard = self.inner.lock().await;
        Ok(live(&guard)?.sftp.upload(local, remote).await?)
    }

    async fn remove_file(&self, path: &str) -> EngineResult<()> {
        let guard = self.inner.lock().await;
        Ok(live(&guard)?.sftp.remove_file(path).await?)
    }

    async fn remove_dir(&self, path: &str) -> EngineResult<()> {
        let guard = self.inner.lock().await;
        Ok(live(&guard)?.sftp.remove_dir(path).await?)
    }

    async fn disconnect(&self) {
        if let Some(live) = self.inner.lock().await.take() {
            teardown(live).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> RemoteSession {
        let dir = std::env::temp_dir().join("mediasweep-test-known-hosts-absent");
        RemoteSession::new(Arc::new(KnownHostsStore::with_path(dir)))
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let session = session();
        assert!(!session.is_connected().await);
        assert!(matches!(
            session.list_dir("/photos").await,
            Err(EngineError::NotConnected)
        ));
        assert!(matches!(
            session.remove_file("/photos/a.jpg").await,
            Err(EngineError::NotConnected)
        ));
        assert!(matches!(session.ping().await, Err(EngineError::NotConnected)));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let session = session();
        session.disconnect().await;
        session.disconnect().await;
        assert!(!session.is_connected().await);
    }
}
