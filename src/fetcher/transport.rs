//! Remote shell transport seam.
//!
//! The poll engine only needs "run one command on one host and give me both
//! output streams". Everything session-related stays behind this trait, which
//! also keeps the engine testable without live SSH daemons.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failures to establish or drive a session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP/SSH connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Connection not established within the connect timeout.
    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Session did not become ready (auth + channel) within the ready timeout.
    #[error("session not ready after {0:?}")]
    ReadyTimeout(Duration),

    /// Server rejected the credentials.
    #[error("authentication rejected for user {0}")]
    Auth(String),

    /// Command channel failed mid-exchange.
    #[error("session failure: {0}")]
    Session(String),
}

/// Connection coordinates for one target.
#[derive(Debug, Clone, Copy)]
pub struct ShellEndpoint<'a> {
    pub host: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Captured output streams of one remote command.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// One-shot remote command execution.
#[async_trait]
pub trait ShellTransport: Send + Sync {
    /// Open a session to the endpoint, run one command, and release the
    /// session before returning — on every exit path.
    async fn exec(
        &self,
        endpoint: ShellEndpoint<'_>,
        command: &str,
    ) -> Result<ExecOutput, TransportError>;
}
