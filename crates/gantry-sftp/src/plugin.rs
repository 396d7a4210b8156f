//! Plugin descriptor for SFTP-backed mounts.

use async_trait::async_trait;

use gantry_backend::{
    Backend, BackendResult, ConfigField, ConfigService, ConfigTemplate, FieldType, Plugin,
};

use crate::backend::SftpBackend;
use crate::ssh::SshDialer;

/// The SFTP plugin.
#[derive(Debug, Default)]
pub struct SftpPlugin;

#[async_trait]
impl Plugin for SftpPlugin {
    fn name(&self) -> &'static str {
        "sftp"
    }

    fn description(&self) -> &'static str {
        "SFTP-backed remote filesystem mount"
    }

    fn config_template(&self) -> ConfigTemplate {
        ConfigTemplate::from([
            (
                "host",
                ConfigField::required(FieldType::String, "Remote SFTP server hostname"),
            ),
            (
                "port",
                ConfigField::required(FieldType::String, "SFTP port (default 22)"),
            ),
            (
                "username",
                ConfigField::required(FieldType::String, "Username for SFTP"),
            ),
            (
                "password",
                ConfigField::optional(
                    FieldType::String,
                    "Password for SFTP (stored in plaintext, demo only)",
                ),
            ),
            (
                "use_ssh_agent",
                ConfigField::optional(
                    FieldType::Bool,
                    "Use the local SSH key agent for authentication (if available)",
                ),
            ),
            (
                "path",
                ConfigField::required(FieldType::String, "Remote path prefix for all requests"),
            ),
            (
                "host_fingerprint",
                ConfigField::optional(
                    FieldType::String,
                    "Pin the server host key to this SHA-256 fingerprint",
                ),
            ),
            (
                "insecure_accept_any",
                ConfigField::optional(
                    FieldType::Bool,
                    "Accept any server host key (insecure, demo only)",
                ),
            ),
        ])
    }

    async fn new_backend(
        &self,
        mount: &str,
        config: &dyn ConfigService,
    ) -> BackendResult<Box<dyn Backend>> {
        let backend = SftpBackend::connect(mount, config, Box::new(SshDialer)).await?;
        Ok(Box::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let plugin = SftpPlugin;
        assert_eq!(plugin.name(), "sftp");
        assert_eq!(plugin.description(), "SFTP-backed remote filesystem mount");
    }

    #[test]
    fn test_template_fields() {
        let template = SftpPlugin.config_template();
        assert_eq!(template.len(), 8);

        for field in ["host", "port", "username", "path"] {
            assert!(template[field].required, "{field} should be required");
        }
        for field in [
            "password",
            "use_ssh_agent",
            "host_fingerprint",
            "insecure_accept_any",
        ] {
            assert!(!template[field].required, "{field} should be optional");
        }

        assert_eq!(template["use_ssh_agent"].field_type, FieldType::Bool);
        assert_eq!(template["host"].field_type, FieldType::String);
    }
}
