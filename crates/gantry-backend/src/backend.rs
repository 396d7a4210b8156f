//! Backend operations trait.

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::types::FileInfo;

/// Operations a live mount must support.
///
/// Paths are relative to the mount root; each plugin resolves them
/// against whatever remote prefix its configuration names.
/// Implementations take `&self` and guard shared connection state
/// internally, so a host may share one instance across tasks.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List the directory entries at `path`.
    ///
    /// Entry order is whatever the remote returns.
    async fn list(&self, path: &str) -> BackendResult<Vec<FileInfo>>;

    /// Read the entire file at `path` into memory.
    async fn read(&self, path: &str) -> BackendResult<Vec<u8>>;

    /// Create or truncate the file at `path` and write `data`.
    ///
    /// Not atomic: a failure mid-write can leave a partially written
    /// remote file.
    async fn write(&self, path: &str, data: &[u8]) -> BackendResult<()>;

    /// Delete the file at `path`.
    async fn delete(&self, path: &str) -> BackendResult<()>;

    /// Close the underlying connection.
    ///
    /// Further operations fail with
    /// [`BackendError::NotConnected`](crate::BackendError::NotConnected)
    /// until a successful [`reconnect`](Backend::reconnect). Closing an
    /// already-closed backend is a no-op.
    async fn close(&self) -> BackendResult<()>;

    /// Tear down and re-establish the connection using the same
    /// identity and address as the initial connect.
    ///
    /// Never invoked implicitly: the host decides a connection is
    /// broken and calls this. On failure the backend is left
    /// unconnected.
    async fn reconnect(&self) -> BackendResult<()>;
}
