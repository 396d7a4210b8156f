//! The seam between the backend adapter and the wire.

use async_trait::async_trait;

use gantry_backend::{BackendResult, FileInfo};

use crate::config::SftpConfig;

/// Remote filesystem primitives the adapter needs, in terms of
/// absolute remote paths.
///
/// [`SftpRemote`](crate::ssh::SftpRemote) is the production
/// implementation; [`MemoryRemote`](crate::memory::MemoryRemote)
/// stands in for tests.
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// List the entries of a remote directory.
    async fn read_dir(&self, path: &str) -> BackendResult<Vec<FileInfo>>;

    /// Read an entire remote file into memory.
    async fn read_file(&self, path: &str) -> BackendResult<Vec<u8>>;

    /// Create or truncate a remote file and write `data`.
    async fn write_file(&self, path: &str, data: &[u8]) -> BackendResult<()>;

    /// Remove a remote file.
    async fn remove_file(&self, path: &str) -> BackendResult<()>;

    /// Close the underlying connection.
    async fn close(&self) -> BackendResult<()>;
}

/// Establishes a live [`RemoteFs`] from a resolved configuration.
///
/// The adapter holds one dialer for its whole lifetime and hands it
/// the same stored [`SftpConfig`] on every dial, so reconnecting uses
/// exactly the identity and address of the initial connect.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Dial the remote named by `config`.
    async fn dial(&self, config: &SftpConfig) -> BackendResult<Box<dyn RemoteFs>>;
}
