//! End-to-end backend behavior against an in-memory remote.
//!
//! Drives configuration lookup, path prefixing, the connection state
//! machine, and reconnect through the same seams the host mount
//! manager uses.

use std::collections::HashMap;

use serde_json::json;

use gantry_backend::{Backend, BackendError, ConfigService, MountConfig};
use gantry_sftp::{MemoryDialer, SftpBackend};

struct StaticConfigs(HashMap<String, MountConfig>);

impl ConfigService for StaticConfigs {
    fn mount_config(&self, mount: &str) -> Option<MountConfig> {
        self.0.get(mount).cloned()
    }
}

fn configs() -> StaticConfigs {
    let docs = json!({
        "host": "files.example.net",
        "port": "2022",
        "username": "deploy",
        "password": "hunter2",
        "path": "/srv/data",
        "insecure_accept_any": true,
    })
    .as_object()
    .unwrap()
    .clone();

    let broken = json!({
        "host": "files.example.net",
        "port": "2022",
        "username": "deploy",
        "password": "hunter2",
        "insecure_accept_any": true,
    })
    .as_object()
    .unwrap()
    .clone();

    StaticConfigs(HashMap::from([
        ("docs".to_string(), docs),
        ("no-path".to_string(), broken),
    ]))
}

async fn connect(mount: &str, dialer: &MemoryDialer) -> Result<SftpBackend, BackendError> {
    SftpBackend::connect(mount, &configs(), Box::new(dialer.clone())).await
}

#[tokio::test]
async fn test_unknown_mount_is_config_missing() {
    let err = connect("photos", &MemoryDialer::new()).await.unwrap_err();
    assert!(matches!(err, BackendError::ConfigMissing(_)));
}

#[tokio::test]
async fn test_config_without_path_is_invalid_not_a_crash() {
    let err = connect("no-path", &MemoryDialer::new()).await.unwrap_err();
    assert!(matches!(err, BackendError::ConfigInvalid(_)));
}

#[tokio::test]
async fn test_effective_paths_are_prefix_plus_relative() {
    let dialer = MemoryDialer::new();
    dialer.add_dir("/srv/data/in");
    let backend = connect("docs", &dialer).await.unwrap();

    backend.list("/in").await.unwrap();
    backend.write("/in/a.bin", b"abc").await.unwrap();
    backend.read("/in/a.bin").await.unwrap();
    backend.delete("/in/a.bin").await.unwrap();

    assert_eq!(
        dialer.requested_paths(),
        vec![
            "/srv/data/in",
            "/srv/data/in/a.bin",
            "/srv/data/in/a.bin",
            "/srv/data/in/a.bin",
        ]
    );
}

#[tokio::test]
async fn test_write_read_roundtrip() {
    let dialer = MemoryDialer::new();
    dialer.add_dir("/srv/data");
    let backend = connect("docs", &dialer).await.unwrap();

    let payload = b"round trip payload \x00\xff".to_vec();
    backend.write("/fresh.bin", &payload).await.unwrap();
    assert_eq!(backend.read("/fresh.bin").await.unwrap(), payload);

    let listed = backend.list("").await.unwrap();
    let entry = listed.iter().find(|e| e.name == "fresh.bin").unwrap();
    assert_eq!(entry.size, payload.len() as u64);
    assert!(!entry.is_dir);
}

#[tokio::test]
async fn test_delete_missing_path_is_not_found() {
    let dialer = MemoryDialer::new();
    let backend = connect("docs", &dialer).await.unwrap();

    let err = backend.delete("/never-existed").await.unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn test_closed_backend_refuses_every_operation() {
    let dialer = MemoryDialer::new();
    dialer.add_file("/srv/data/a.txt", b"x");
    let backend = connect("docs", &dialer).await.unwrap();

    backend.close().await.unwrap();

    assert!(matches!(
        backend.list("").await,
        Err(BackendError::NotConnected)
    ));
    assert!(matches!(
        backend.read("/a.txt").await,
        Err(BackendError::NotConnected)
    ));
    assert!(matches!(
        backend.write("/a.txt", b"y").await,
        Err(BackendError::NotConnected)
    ));
    assert!(matches!(
        backend.delete("/a.txt").await,
        Err(BackendError::NotConnected)
    ));

    // No implicit reconnect happened along the way.
    assert_eq!(dialer.dialed().len(), 1);
}

#[tokio::test]
async fn test_reconnect_reuses_original_credentials() {
    let dialer = MemoryDialer::new();
    dialer.add_file("/srv/data/kept.txt", b"still here");
    let backend = connect("docs", &dialer).await.unwrap();

    backend.close().await.unwrap();
    backend.reconnect().await.unwrap();

    let dialed = dialer.dialed();
    assert_eq!(dialed.len(), 2);
    assert_eq!(dialed[1], dialed[0]);
    assert_eq!(dialed[1].host, "files.example.net");
    assert_eq!(dialed[1].port, 2022);
    assert_eq!(dialed[1].username, "deploy");
    assert_eq!(dialed[1].password.as_deref(), Some("hunter2"));
    assert_eq!(dialed[1].path, "/srv/data");

    // Operations work exactly as before the disconnect.
    assert_eq!(backend.read("/kept.txt").await.unwrap(), b"still here");
    backend.write("/new.txt", b"post-reconnect").await.unwrap();
    backend.list("").await.unwrap();
}

#[tokio::test]
async fn test_failed_reconnect_leaves_backend_unconnected() {
    let dialer = MemoryDialer::new();
    dialer.add_dir("/srv/data");
    let backend = connect("docs", &dialer).await.unwrap();

    dialer.refuse_dials(true);
    assert!(matches!(
        backend.reconnect().await,
        Err(BackendError::Dial(_))
    ));
    assert!(matches!(
        backend.list("").await,
        Err(BackendError::NotConnected)
    ));
}
