//! Per-target fetch state machine with linear backoff.
//!
//! # States
//! ```text
//! Connecting → Executing → Parsed-OK            (return count)
//!     │            │
//!     └────────────┴──▶ Attempt-Failed
//!                         │  attempt < max: sleep(base * attempt), reconnect
//!                         └─ attempt = max ──▶ Exhausted (return error)
//! ```
//!
//! # Design Decisions
//! - Bounded loop with an attempt counter, never recursion
//! - Backoff is deterministic linear (`base_delay * attempt`), monotonically
//!   non-decreasing across attempts
//! - Every attempt gets a fresh session; the transport guarantees release

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::fetcher::summary;
use crate::fetcher::transport::{ShellEndpoint, ShellTransport, TransportError};
use crate::store::Target;

/// Fixed diagnostic command run on every target.
pub const VPN_SUMMARY_COMMAND: &str = "/usr/local/openvpn_as/scripts/sacli VPNSummary";

/// Failures of a single fetch attempt, and the terminal exhausted form.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Session could not be established or broke mid-exchange.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote command reported on its error stream.
    #[error("remote command error: {0}")]
    Command(String),

    /// Command output was not a parseable summary payload.
    #[error("unparseable summary output: {0}")]
    Parse(#[from] serde_json::Error),

    /// All attempts failed; wraps the last underlying cause.
    #[error("failed to get client count after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

/// Retrieves the live client count from one target over the shell transport.
pub struct MetricFetcher {
    transport: Arc<dyn ShellTransport>,
    base_delay: Duration,
}

/// Delay before retrying after a failed attempt. Linear in the attempt
/// number: base, 2*base, 3*base, ...
pub fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    base_delay * attempt
}

impl MetricFetcher {
    pub fn new(transport: Arc<dyn ShellTransport>, base_delay: Duration) -> Self {
        Self {
            transport,
            base_delay,
        }
    }

    /// Fetch the client count, retrying up to `max_attempts` total attempts.
    ///
    /// Local attempt failures never escape; the only error returned is
    /// `FetchError::Exhausted`.
    pub async fn fetch(&self, target: &Target, max_attempts: u32) -> Result<i64, FetchError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(target).await {
                Ok(clients) => {
                    tracing::info!(
                        hostname = %target.hostname,
                        ip = %target.ip,
                        attempt,
                        clients,
                        "client count fetched"
                    );
                    return Ok(clients);
                }
                Err(cause) => {
                    tracing::warn!(
                        hostname = %target.hostname,
                        ip = %target.ip,
                        attempt,
                        error = %cause,
                        "fetch attempt failed"
                    );

                    if attempt >= max_attempts {
                        return Err(FetchError::Exhausted {
                            attempts: max_attempts,
                            last: Box::new(cause),
                        });
                    }

                    tokio::time::sleep(backoff_delay(self.base_delay, attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One attempt: connect, execute, parse. The session is released by the
    /// transport before this returns.
    async fn attempt(&self, target: &Target) -> Result<i64, FetchError> {
        let endpoint = ShellEndpoint {
            host: &target.ip,
            username: &target.username,
            password: &target.password,
        };

        let output = self.transport.exec(endpoint, VPN_SUMMARY_COMMAND).await?;

        // Error stream is authoritative, even when stdout is non-empty.
        if !output.stderr.trim().is_empty() {
            return Err(FetchError::Command(output.stderr.trim().to_string()));
        }

        Ok(summary::parse_client_count(&output.stdout)?)
    }
}
