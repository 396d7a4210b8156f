//! Plugin descriptors and configuration lookup.
//!
//! A plugin declares what it is (name, description) and what it needs
//! (a configuration template the host renders and validates). The host
//! stores per-mount configuration as loosely-typed JSON and hands it
//! back through [`ConfigService`] when a mount is activated.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::backend::Backend;
use crate::error::BackendResult;

/// Per-mount configuration as the host stores it: JSON key/value
/// pairs. Plugins validate these into their own typed structs.
pub type MountConfig = serde_json::Map<String, serde_json::Value>;

/// Per-mount configuration lookup, provided by the host.
pub trait ConfigService: Send + Sync {
    /// Fetch the configuration for `mount`, if any exists.
    fn mount_config(&self, mount: &str) -> Option<MountConfig>;
}

/// Declared type of one configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free-form string value.
    String,
    /// Boolean flag.
    Bool,
}

/// One field of a plugin's configuration schema.
///
/// Purely descriptive: the host uses it to render and validate
/// configuration input. No runtime logic lives here.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigField {
    /// Declared value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable description shown in configuration UIs.
    pub description: &'static str,
    /// Whether the host must require a value.
    pub required: bool,
}

impl ConfigField {
    /// A required field.
    pub fn required(field_type: FieldType, description: &'static str) -> Self {
        Self {
            field_type,
            description,
            required: true,
        }
    }

    /// An optional field.
    pub fn optional(field_type: FieldType, description: &'static str) -> Self {
        Self {
            field_type,
            description,
            required: false,
        }
    }
}

/// Field name → declared field, ordered for stable rendering.
pub type ConfigTemplate = BTreeMap<&'static str, ConfigField>;

/// A storage plugin: descriptor plus backend factory.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable name the host keys its registry by.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Declarative configuration schema.
    fn config_template(&self) -> ConfigTemplate;

    /// Build a backend for `mount`, performing one connection attempt.
    async fn new_backend(
        &self,
        mount: &str,
        config: &dyn ConfigService,
    ) -> BackendResult<Box<dyn Backend>>;
}
