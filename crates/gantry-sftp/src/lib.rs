//! SFTP-backed remote filesystem plugin.
//!
//! Maps the gantry [`Backend`](gantry_backend::Backend) surface onto a
//! remote SFTP server. The plugin is a thin adapter: connection setup,
//! authentication selection, and path prefixing are the entire
//! surface; the SSH transport and SFTP wire protocol live in `russh`
//! and `russh-sftp`.
//!
//! # Architecture
//!
//! ```text
//! SftpPlugin (descriptor + factory)
//! └── SftpBackend (prefixing, connection state, reconnect)
//!     └── dyn RemoteFs ← dialed by dyn Dialer
//!         ├── SftpRemote (russh + russh-sftp, production)
//!         └── MemoryRemote (in-memory, tests)
//! ```
//!
//! One outbound connection per backend instance, guarded by a mutex so
//! concurrent callers serialize instead of racing on the shared
//! session. There is no pooling, no listing cache, and no automatic
//! reconnect: the host detects a broken connection and calls
//! [`Backend::reconnect`](gantry_backend::Backend::reconnect), which
//! redials with the credentials resolved at mount activation.

pub mod backend;
pub mod config;
pub mod memory;
pub mod plugin;
pub mod remote;
pub mod ssh;

pub use backend::SftpBackend;
pub use config::{HostKeyPolicy, SftpConfig};
pub use memory::{MemoryDialer, MemoryRemote};
pub use plugin::SftpPlugin;
pub use remote::{Dialer, RemoteFs};
pub use ssh::SshDialer;
