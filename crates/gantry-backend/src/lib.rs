//! Storage backend capability surface for gantry mounts.
//!
//! A *mount* is a named, user-facing filesystem root served by one
//! backend plugin instance and its configuration. This crate defines
//! everything the host mount manager needs from a plugin and nothing
//! else:
//!
//! - [`Backend`] - the operations a live mount must support
//! - [`FileInfo`] - the directory listing projection
//! - [`BackendError`] - the shared error surface
//! - [`Plugin`] - descriptor plus backend factory for one plugin kind
//! - [`ConfigService`] - per-mount configuration lookup
//!
//! It has **no internal gantry dependencies** — a pure leaf crate that
//! plugin crates build on.

pub mod backend;
pub mod error;
pub mod plugin;
pub mod types;

pub use backend::Backend;
pub use error::{BackendError, BackendResult};
pub use plugin::{ConfigField, ConfigService, ConfigTemplate, FieldType, MountConfig, Plugin};
pub use types::FileInfo;
