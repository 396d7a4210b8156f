//! In-memory remote filesystem.
//!
//! Stands in for a live SFTP session in tests: captures the exact
//! absolute paths operations are invoked with, round-trips file
//! contents, and lets tests observe which configurations were dialed.
//! All data is ephemeral.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use gantry_backend::{BackendError, BackendResult, FileInfo};

use crate::config::SftpConfig;
use crate::remote::{Dialer, RemoteFs};

/// Shared filesystem state behind every remote a dialer hands out.
#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    /// Every absolute path an operation was invoked with, in order.
    requested_paths: Vec<String>,
}

impl MemoryState {
    /// Register every ancestor directory of `path`.
    fn register_parents(&mut self, path: &str) {
        for (i, _) in path.match_indices('/') {
            if i > 0 {
                self.dirs.insert(path[..i].to_string());
            }
        }
    }
}

/// In-memory [`RemoteFs`].
///
/// Remotes produced by one [`MemoryDialer`] share a filesystem, so a
/// reconnected remote sees the same data as the one it replaced.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
    closed: Arc<AtomicBool>,
}

impl MemoryRemote {
    /// Create a standalone empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> BackendResult<MutexGuard<'_, MemoryState>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::remote("session is closed"));
        }
        self.state
            .lock()
            .map_err(|_| BackendError::remote("lock poisoned"))
    }
}

#[async_trait]
impl RemoteFs for MemoryRemote {
    async fn read_dir(&self, path: &str) -> BackendResult<Vec<FileInfo>> {
        let mut state = self.lock()?;
        state.requested_paths.push(path.to_string());

        if state.files.contains_key(path) {
            return Err(BackendError::remote(format!("not a directory: {path}")));
        }
        if path != "/" && !state.dirs.contains(path) {
            return Err(BackendError::not_found(path));
        }

        let prefix = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };

        let mut out = Vec::new();
        for (key, data) in &state.files {
            if let Some(rest) = key.strip_prefix(&prefix) {
                if !rest.is_empty() && !rest.contains('/') {
                    out.push(FileInfo::file(rest, data.len() as u64));
                }
            }
        }
        for dir in &state.dirs {
            if let Some(rest) = dir.strip_prefix(&prefix) {
                if !rest.is_empty() && !rest.contains('/') {
                    out.push(FileInfo::directory(rest));
                }
            }
        }
        Ok(out)
    }

    async fn read_file(&self, path: &str) -> BackendResult<Vec<u8>> {
        let mut state = self.lock()?;
        state.requested_paths.push(path.to_string());
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::not_found(path))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.requested_paths.push(path.to_string());
        state.register_parents(path);
        state.files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> BackendResult<()> {
        let mut state = self.lock()?;
        state.requested_paths.push(path.to_string());
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BackendError::not_found(path))
    }

    async fn close(&self) -> BackendResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Dials [`MemoryRemote`]s over one shared filesystem.
///
/// Records every configuration it is handed so tests can assert that
/// reconnecting reuses the credentials of the initial connect, and can
/// be told to refuse dials to exercise failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryDialer {
    inner: Arc<DialerInner>,
}

#[derive(Debug, Default)]
struct DialerInner {
    state: Arc<Mutex<MemoryState>>,
    dialed: Mutex<Vec<SftpConfig>>,
    refuse: AtomicBool,
}

impl MemoryDialer {
    /// Create a dialer over an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a remote directory (ancestors included).
    pub fn add_dir(&self, path: &str) {
        let mut state = self.lock_state();
        state.register_parents(path);
        state.dirs.insert(path.to_string());
    }

    /// Pre-populate a remote file (ancestor directories included).
    pub fn add_file(&self, path: &str, data: &[u8]) {
        let mut state = self.lock_state();
        state.register_parents(path);
        state.files.insert(path.to_string(), data.to_vec());
    }

    /// Configurations handed to `dial`, in order.
    pub fn dialed(&self) -> Vec<SftpConfig> {
        self.inner
            .dialed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Absolute paths operations were invoked with, across every
    /// remote this dialer produced.
    pub fn requested_paths(&self) -> Vec<String> {
        self.lock_state().requested_paths.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make subsequent dials fail.
    pub fn refuse_dials(&self, refuse: bool) {
        self.inner.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, config: &SftpConfig) -> BackendResult<Box<dyn RemoteFs>> {
        self.inner
            .dialed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(config.clone());
        if self.inner.refuse.load(Ordering::SeqCst) {
            return Err(BackendError::dial(format!(
                "connect to {} refused",
                config.addr()
            )));
        }
        Ok(Box::new(MemoryRemote {
            state: Arc::clone(&self.inner.state),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}
