//! SSH implementation of the shell transport.
//!
//! # Responsibilities
//! - Establish one SSH session per exec call (password auth)
//! - Run the command and capture stdout/stderr
//! - Release the session on every exit path
//!
//! # Design Decisions
//! - Host keys are accepted blindly; targets are operator-registered
//! - Connect and session-ready phases carry separate timeouts
//! - The connection handle is dropped (closing the socket) even when
//!   disconnect itself fails

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use russh_keys::key;
use tokio::time::timeout;

use crate::config::SshConfig;
use crate::fetcher::transport::{ExecOutput, ShellEndpoint, ShellTransport, TransportError};

const DEFAULT_SSH_PORT: u16 = 22;

/// SSH transport with fixed connect/ready timeouts.
pub struct SshTransport {
    connect_timeout: Duration,
    ready_timeout: Duration,
}

struct AcceptAllHostKeys;

#[async_trait]
impl client::Handler for AcceptAllHostKeys {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl SshTransport {
    pub fn new(config: &SshConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
        }
    }

    /// Split an optional `:port` suffix off the host. Plain IPv4/hostname
    /// entries fall back to port 22.
    fn host_port(host: &str) -> (&str, u16) {
        if let Some((h, p)) = host.rsplit_once(':') {
            if let Ok(port) = p.parse::<u16>() {
                return (h, port);
            }
        }
        (host, DEFAULT_SSH_PORT)
    }

    async fn run_command(
        &self,
        handle: &mut client::Handle<AcceptAllHostKeys>,
        endpoint: ShellEndpoint<'_>,
        command: &str,
    ) -> Result<ExecOutput, TransportError> {
        let authenticated = timeout(
            self.ready_timeout,
            handle.authenticate_password(endpoint.username, endpoint.password),
        )
        .await
        .map_err(|_| TransportError::ReadyTimeout(self.ready_timeout))?
        .map_err(|e| TransportError::Session(e.to_string()))?;

        if !authenticated {
            return Err(TransportError::Auth(endpoint.username.to_string()));
        }

        let mut channel = timeout(self.ready_timeout, handle.channel_open_session())
            .await
            .map_err(|_| TransportError::ReadyTimeout(self.ready_timeout))?
            .map_err(|e| TransportError::Session(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| TransportError::Session(e.to_string()))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                _ => {}
            }
        }

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

#[async_trait]
impl ShellTransport for SshTransport {
    async fn exec(
        &self,
        endpoint: ShellEndpoint<'_>,
        command: &str,
    ) -> Result<ExecOutput, TransportError> {
        let (host, port) = Self::host_port(endpoint.host);

        let config = Arc::new(client::Config::default());
        let mut handle = timeout(
            self.connect_timeout,
            client::connect(config, (host, port), AcceptAllHostKeys),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout(self.connect_timeout))?
        .map_err(|e| TransportError::Connect(e.to_string()))?;

        let result = self.run_command(&mut handle, endpoint, command).await;

        // Session release happens here on every path; even if the polite
        // disconnect fails, dropping the handle closes the socket.
        let _ = handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_port_splits_explicit_port() {
        assert_eq!(SshTransport::host_port("10.0.0.5:2222"), ("10.0.0.5", 2222));
    }

    #[test]
    fn host_port_defaults_to_22() {
        assert_eq!(SshTransport::host_port("10.0.0.5"), ("10.0.0.5", 22));
    }

    #[test]
    fn host_port_ignores_non_numeric_suffix() {
        assert_eq!(SshTransport::host_port("vpn:alpha"), ("vpn:alpha", 22));
    }
}
