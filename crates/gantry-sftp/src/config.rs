//! Typed mount configuration.
//!
//! The host hands plugins a loosely-typed JSON map. Everything is
//! validated here, once, into [`SftpConfig`]; every defect surfaces as
//! [`BackendError::ConfigInvalid`] naming the offending field.

use gantry_backend::{BackendError, BackendResult, MountConfig};
use serde_json::Value;

/// Default SFTP port when the configuration omits one.
const DEFAULT_PORT: u16 = 22;

/// How to treat the server's host key during the SSH handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Require the server key's SHA-256 fingerprint to match.
    Pinned(String),
    /// Accept any server key. Logged loudly on every connect.
    InsecureAcceptAny,
}

/// Resolved configuration for one SFTP mount.
///
/// Held unchanged for the backend's lifetime; reconnect reuses it so a
/// rebuilt connection carries the same identity and address as the
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftpConfig {
    /// Remote server hostname.
    pub host: String,
    /// Remote server port.
    pub port: u16,
    /// Username to authenticate as.
    pub username: String,
    /// Password, if password authentication is configured.
    pub password: Option<String>,
    /// Whether to offer identities from the local key agent.
    pub use_ssh_agent: bool,
    /// Remote directory prefix all mount-relative paths resolve under.
    pub path: String,
    /// Host-key trust policy.
    pub host_key: HostKeyPolicy,
}

impl SftpConfig {
    /// Validate a mount's raw configuration map.
    pub fn from_map(cfg: &MountConfig) -> BackendResult<Self> {
        let host = required_str(cfg, "host")?;
        let username = required_str(cfg, "username")?;

        let path = match cfg.get("path") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(BackendError::config_invalid("field 'path' must be a string"));
            }
            None => {
                return Err(BackendError::config_invalid("missing required field 'path'"));
            }
        };

        let port = parse_port(cfg)?;
        let password = optional_str(cfg, "password")?.filter(|p| !p.is_empty());
        let use_ssh_agent = optional_bool(cfg, "use_ssh_agent")?;

        let fingerprint = optional_str(cfg, "host_fingerprint")?.filter(|f| !f.is_empty());
        let insecure = optional_bool(cfg, "insecure_accept_any")?;
        let host_key = match (fingerprint, insecure) {
            (Some(fp), _) => HostKeyPolicy::Pinned(fp),
            (None, true) => HostKeyPolicy::InsecureAcceptAny,
            (None, false) => {
                return Err(BackendError::config_invalid(
                    "no host key trust anchor: set host_fingerprint, \
                     or set insecure_accept_any to accept any server key",
                ));
            }
        };

        Ok(Self {
            host,
            port,
            username,
            password,
            use_ssh_agent,
            path,
            host_key,
        })
    }

    /// `host:port` dial address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The port is declared as a string field; tolerate a JSON number too.
fn parse_port(cfg: &MountConfig) -> BackendResult<u16> {
    match cfg.get("port") {
        None => Ok(DEFAULT_PORT),
        Some(Value::String(s)) if s.is_empty() => Ok(DEFAULT_PORT),
        Some(Value::String(s)) => s.parse::<u16>().map_err(|_| {
            BackendError::config_invalid(format!("field 'port' is not a valid port number: '{s}'"))
        }),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| {
                BackendError::config_invalid(format!("field 'port' is out of range: {n}"))
            }),
        Some(_) => Err(BackendError::config_invalid("field 'port' must be a string")),
    }
}

fn required_str(cfg: &MountConfig, field: &str) -> BackendResult<String> {
    match cfg.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(BackendError::config_invalid(format!(
            "required field '{field}' is empty"
        ))),
        Some(_) => Err(BackendError::config_invalid(format!(
            "field '{field}' must be a string"
        ))),
        None => Err(BackendError::config_invalid(format!(
            "missing required field '{field}'"
        ))),
    }
}

fn optional_str(cfg: &MountConfig, field: &str) -> BackendResult<Option<String>> {
    match cfg.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(BackendError::config_invalid(format!(
            "field '{field}' must be a string"
        ))),
    }
}

fn optional_bool(cfg: &MountConfig, field: &str) -> BackendResult<bool> {
    match cfg.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(BackendError::config_invalid(format!(
            "field '{field}' must be a bool"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> MountConfig {
        json!({
            "host": "files.example.net",
            "port": "2022",
            "username": "deploy",
            "password": "hunter2",
            "path": "/srv/files",
            "insecure_accept_any": true,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_full_config() {
        let cfg = SftpConfig::from_map(&base()).unwrap();
        assert_eq!(cfg.host, "files.example.net");
        assert_eq!(cfg.port, 2022);
        assert_eq!(cfg.username, "deploy");
        assert_eq!(cfg.password.as_deref(), Some("hunter2"));
        assert!(!cfg.use_ssh_agent);
        assert_eq!(cfg.path, "/srv/files");
        assert_eq!(cfg.host_key, HostKeyPolicy::InsecureAcceptAny);
        assert_eq!(cfg.addr(), "files.example.net:2022");
    }

    #[test]
    fn test_port_defaults_to_22() {
        let mut raw = base();
        raw.remove("port");
        assert_eq!(SftpConfig::from_map(&raw).unwrap().port, 22);

        raw.insert("port".into(), json!(""));
        assert_eq!(SftpConfig::from_map(&raw).unwrap().port, 22);
    }

    #[test]
    fn test_port_accepts_json_number() {
        let mut raw = base();
        raw.insert("port".into(), json!(2222));
        assert_eq!(SftpConfig::from_map(&raw).unwrap().port, 2222);
    }

    #[test]
    fn test_bad_port_is_config_invalid() {
        let mut raw = base();
        raw.insert("port".into(), json!("not-a-port"));
        assert!(matches!(
            SftpConfig::from_map(&raw),
            Err(BackendError::ConfigInvalid(_))
        ));

        raw.insert("port".into(), json!(70000));
        assert!(matches!(
            SftpConfig::from_map(&raw),
            Err(BackendError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_empty_password_means_none() {
        let mut raw = base();
        raw.insert("password".into(), json!(""));
        assert_eq!(SftpConfig::from_map(&raw).unwrap().password, None);
    }

    #[test]
    fn test_missing_path_is_config_invalid_not_a_crash() {
        let mut raw = base();
        raw.remove("path");
        let err = SftpConfig::from_map(&raw).unwrap_err();
        assert!(matches!(err, BackendError::ConfigInvalid(_)));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_wrong_type_path_is_config_invalid() {
        let mut raw = base();
        raw.insert("path".into(), json!(42));
        assert!(matches!(
            SftpConfig::from_map(&raw),
            Err(BackendError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_empty_host_or_username_rejected() {
        let mut raw = base();
        raw.insert("host".into(), json!(""));
        assert!(matches!(
            SftpConfig::from_map(&raw),
            Err(BackendError::ConfigInvalid(_))
        ));

        let mut raw = base();
        raw.remove("username");
        assert!(matches!(
            SftpConfig::from_map(&raw),
            Err(BackendError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_wrong_type_agent_flag_rejected() {
        let mut raw = base();
        raw.insert("use_ssh_agent".into(), json!("yes"));
        assert!(matches!(
            SftpConfig::from_map(&raw),
            Err(BackendError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_fingerprint_wins_over_insecure_flag() {
        let mut raw = base();
        raw.insert("host_fingerprint".into(), json!("SHA256:abcdef"));
        let cfg = SftpConfig::from_map(&raw).unwrap();
        assert_eq!(cfg.host_key, HostKeyPolicy::Pinned("SHA256:abcdef".into()));
    }

    #[test]
    fn test_no_trust_anchor_rejected() {
        let mut raw = base();
        raw.remove("insecure_accept_any");
        let err = SftpConfig::from_map(&raw).unwrap_err();
        assert!(err.to_string().contains("host_fingerprint"));
    }
}
