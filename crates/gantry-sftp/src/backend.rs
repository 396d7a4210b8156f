//! The SFTP backend adapter.
//!
//! Routes the five mount operations to a live remote, prefixing every
//! caller-supplied path with the configured remote directory.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use gantry_backend::{Backend, BackendError, BackendResult, ConfigService, FileInfo};

use crate::config::SftpConfig;
use crate::remote::{Dialer, RemoteFs};

/// An SFTP-backed mount.
///
/// Owns one live connection at a time, guarded by a mutex so
/// concurrent callers serialize on the shared session. The resolved
/// configuration is kept for the backend's lifetime; `reconnect`
/// redials with it, so a rebuilt connection carries exactly the
/// identity and address of the initial connect.
pub struct SftpBackend {
    mount: String,
    config: SftpConfig,
    dialer: Box<dyn Dialer>,
    remote: Mutex<Option<Box<dyn RemoteFs>>>,
}

impl std::fmt::Debug for SftpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpBackend")
            .field("mount", &self.mount)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SftpBackend {
    /// Resolve `mount`'s configuration and perform the one initial
    /// connection attempt.
    pub async fn connect(
        mount: &str,
        config_svc: &dyn ConfigService,
        dialer: Box<dyn Dialer>,
    ) -> BackendResult<Self> {
        let raw = config_svc
            .mount_config(mount)
            .ok_or_else(|| BackendError::config_missing(mount))?;
        let config = SftpConfig::from_map(&raw)?;
        let remote = dialer.dial(&config).await?;
        debug!(mount, addr = %config.addr(), "sftp backend connected");

        Ok(Self {
            mount: mount.to_string(),
            config,
            dialer,
            remote: Mutex::new(Some(remote)),
        })
    }

    /// Effective remote path: the configured prefix concatenated with
    /// the mount-relative path, verbatim. No normalization.
    fn full_path(&self, path: &str) -> String {
        format!("{}{}", self.config.path, path)
    }
}

#[async_trait]
impl Backend for SftpBackend {
    async fn list(&self, path: &str) -> BackendResult<Vec<FileInfo>> {
        let abs = self.full_path(path);
        debug!(mount = %self.mount, path = %abs, "list");
        let guard = self.remote.lock().await;
        let remote = guard.as_deref().ok_or(BackendError::NotConnected)?;
        remote.read_dir(&abs).await
    }

    async fn read(&self, path: &str) -> BackendResult<Vec<u8>> {
        let abs = self.full_path(path);
        debug!(mount = %self.mount, path = %abs, "read");
        let guard = self.remote.lock().await;
        let remote = guard.as_deref().ok_or(BackendError::NotConnected)?;
        remote.read_file(&abs).await
    }

    async fn write(&self, path: &str, data: &[u8]) -> BackendResult<()> {
        let abs = self.full_path(path);
        debug!(mount = %self.mount, path = %abs, bytes = data.len(), "write");
        let guard = self.remote.lock().await;
        let remote = guard.as_deref().ok_or(BackendError::NotConnected)?;
        remote.write_file(&abs, data).await
    }

    async fn delete(&self, path: &str) -> BackendResult<()> {
        let abs = self.full_path(path);
        debug!(mount = %self.mount, path = %abs, "delete");
        let guard = self.remote.lock().await;
        let remote = guard.as_deref().ok_or(BackendError::NotConnected)?;
        remote.remove_file(&abs).await
    }

    async fn close(&self) -> BackendResult<()> {
        let mut guard = self.remote.lock().await;
        match guard.take() {
            Some(remote) => {
                debug!(mount = %self.mount, "sftp backend closed");
                remote.close().await
            }
            None => Ok(()),
        }
    }

    async fn reconnect(&self) -> BackendResult<()> {
        let mut guard = self.remote.lock().await;
        if let Some(old) = guard.take() {
            // Best effort: the old connection may already be dead.
            if let Err(e) = old.close().await {
                debug!(mount = %self.mount, "closing stale connection: {e}");
            }
        }
        let remote = self.dialer.dial(&self.config).await?;
        debug!(mount = %self.mount, addr = %self.config.addr(), "sftp backend reconnected");
        *guard = Some(remote);
        Ok(())
    }
}
