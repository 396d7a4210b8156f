//! SSH dialing and the live SFTP remote.
//!
//! Uses russh for the SSH transport and russh-sftp for the
//! file-transfer subsystem. Authentication tries a configured password
//! first, then each identity offered by the local key agent (reached
//! through the socket named by `SSH_AUTH_SOCK`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::Disconnect;
use russh::client::{self, Config, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::{HashAlg, PublicKey};
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use gantry_backend::{BackendError, BackendResult, FileInfo};

use crate::config::{HostKeyPolicy, SftpConfig};
use crate::remote::{Dialer, RemoteFs};

/// Fixed transport connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client handler enforcing the configured host-key policy.
struct ClientHandler {
    policy: HostKeyPolicy,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        match &self.policy {
            HostKeyPolicy::Pinned(expected) => {
                if fingerprint_matches(expected, &fingerprint) {
                    debug!(%fingerprint, "server key matches pinned fingerprint");
                    Ok(true)
                } else {
                    warn!(%fingerprint, %expected, "server key does not match pinned fingerprint");
                    Ok(false)
                }
            }
            HostKeyPolicy::InsecureAcceptAny => {
                warn!(%fingerprint, "accepting server key without verification (insecure_accept_any is set)");
                Ok(true)
            }
        }
    }
}

/// Compare fingerprints tolerating `SHA256:` prefixes, colon
/// separators, and case differences.
fn fingerprint_matches(expected: &str, actual: &str) -> bool {
    fn normalize(s: &str) -> String {
        s.trim()
            .trim_start_matches("SHA256:")
            .trim_start_matches("sha256:")
            .replace(':', "")
            .to_lowercase()
    }
    normalize(expected) == normalize(actual)
}

/// Dials real SSH/SFTP connections.
#[derive(Debug, Default)]
pub struct SshDialer;

#[async_trait]
impl Dialer for SshDialer {
    async fn dial(&self, config: &SftpConfig) -> BackendResult<Box<dyn RemoteFs>> {
        Ok(Box::new(connect(config).await?))
    }
}

/// Open an SSH connection, authenticate, and negotiate the SFTP
/// subsystem.
async fn connect(config: &SftpConfig) -> BackendResult<SftpRemote> {
    // Agent auth is optional: a failed socket dial just drops the
    // agent from the candidate methods.
    let mut agent = None;
    if config.use_ssh_agent {
        match AgentClient::connect_env().await {
            Ok(client) => agent = Some(client),
            Err(e) => debug!("key agent unavailable, skipping agent auth: {e}"),
        }
    }

    if config.password.is_none() && agent.is_none() {
        return Err(BackendError::NoAuthMethod);
    }

    let ssh_config = Arc::new(Config::default());
    let handler = ClientHandler {
        policy: config.host_key.clone(),
    };
    let addr = (config.host.as_str(), config.port);

    let mut session = tokio::time::timeout(CONNECT_TIMEOUT, client::connect(ssh_config, addr, handler))
        .await
        .map_err(|_| {
            BackendError::dial(format!(
                "connect to {} timed out after {}s",
                config.addr(),
                CONNECT_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| BackendError::dial(format!("connect to {}: {e}", config.addr())))?;

    let mut authenticated = false;

    if let Some(password) = &config.password {
        let result = session
            .authenticate_password(&config.username, password)
            .await
            .map_err(|e| BackendError::dial(format!("password auth: {e}")))?;
        if result.success() {
            debug!(username = %config.username, "authenticated with password");
            authenticated = true;
        } else {
            debug!("password rejected, trying next method");
        }
    }

    if !authenticated {
        if let Some(mut agent) = agent {
            let keys = agent
                .request_identities()
                .await
                .map_err(|e| BackendError::dial(format!("agent identities: {e}")))?;
            debug!("found {} keys in the agent", keys.len());

            // Try each key until one works.
            for key in keys {
                let fingerprint = key.fingerprint(HashAlg::Sha256);
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .ok()
                    .flatten()
                    .flatten();

                let result = session
                    .authenticate_publickey_with(&config.username, key, hash_alg, &mut agent)
                    .await;

                match result {
                    Ok(result) if result.success() => {
                        debug!(%fingerprint, "authenticated with agent key");
                        authenticated = true;
                        break;
                    }
                    Ok(_) => debug!(%fingerprint, "agent key rejected, trying next"),
                    Err(e) => warn!(%fingerprint, "agent auth error: {e}"),
                }
            }
        }
    }

    if !authenticated {
        return Err(BackendError::dial(format!(
            "authentication failed for user '{}' on {}",
            config.username,
            config.addr()
        )));
    }

    let channel = session
        .channel_open_session()
        .await
        .map_err(|e| BackendError::protocol(format!("open channel: {e}")))?;
    channel
        .request_subsystem(true, "sftp")
        .await
        .map_err(|e| BackendError::protocol(format!("request sftp subsystem: {e}")))?;
    let sftp = SftpSession::new(channel.into_stream())
        .await
        .map_err(|e| BackendError::protocol(format!("sftp session init: {e}")))?;

    info!(addr = %config.addr(), username = %config.username, "sftp connection established");

    Ok(SftpRemote { session, sftp })
}

/// A live SSH session with the SFTP subsystem negotiated.
pub struct SftpRemote {
    session: Handle<ClientHandler>,
    sftp: SftpSession,
}

#[async_trait]
impl RemoteFs for SftpRemote {
    async fn read_dir(&self, path: &str) -> BackendResult<Vec<FileInfo>> {
        let entries = self.sftp.read_dir(path).await.map_err(sftp_err(path))?;
        let mut out = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            let metadata = entry.metadata();
            out.push(FileInfo {
                name,
                is_dir: metadata.is_dir(),
                size: metadata.len(),
            });
        }
        Ok(out)
    }

    async fn read_file(&self, path: &str) -> BackendResult<Vec<u8>> {
        // The handle closes on drop, so error paths release it too.
        let mut file = self.sftp.open(path).await.map_err(sftp_err(path))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.map_err(io_err(path))?;
        Ok(buf)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> BackendResult<()> {
        let mut file = self.sftp.create(path).await.map_err(sftp_err(path))?;
        file.write_all(data).await.map_err(io_err(path))?;
        // Explicit shutdown: close errors would be unreported on drop.
        file.shutdown().await.map_err(io_err(path))?;
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> BackendResult<()> {
        self.sftp.remove_file(path).await.map_err(sftp_err(path))
    }

    async fn close(&self) -> BackendResult<()> {
        self.session
            .disconnect(Disconnect::ByApplication, "mount closed", "en")
            .await
            .map_err(|e| BackendError::remote(e.to_string()))
    }
}

/// Map a russh-sftp error onto the backend surface, keeping the
/// library's message.
fn sftp_err(path: &str) -> impl Fn(russh_sftp::client::error::Error) -> BackendError + '_ {
    move |e| match &e {
        russh_sftp::client::error::Error::Status(status)
            if status.status_code == StatusCode::NoSuchFile =>
        {
            BackendError::not_found(path)
        }
        _ => BackendError::remote(e.to_string()),
    }
}

fn io_err(path: &str) -> impl Fn(std::io::Error) -> BackendError + '_ {
    move |e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BackendError::not_found(path)
        } else {
            BackendError::remote(e.to_string())
        }
    }
}
