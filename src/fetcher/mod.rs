//! Remote metric fetching subsystem.
//!
//! # Data Flow
//! ```text
//! fetch.rs (retry state machine)
//!     → transport.rs (ShellTransport seam)
//!         → ssh.rs (russh session: connect, auth, exec, release)
//!     → summary.rs (parse sacli output → client count)
//! ```
//!
//! # Design Decisions
//! - Fresh session per attempt; nothing is reused across attempts or targets
//! - The transport is a trait so tests can script outcomes without a daemon
//! - stderr is authoritative: any remote error output fails the attempt
//!   even when stdout is present

pub mod fetch;
pub mod ssh;
pub mod summary;
pub mod transport;

pub use fetch::{FetchError, MetricFetcher, VPN_SUMMARY_COMMAND};
pub use ssh::SshTransport;
pub use transport::{ExecOutput, ShellEndpoint, ShellTransport, TransportError};
