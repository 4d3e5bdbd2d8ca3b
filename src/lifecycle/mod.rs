//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGINT (ctrl-c)
//!     → Shutdown::trigger()
//!     → API server drains and exits
//!     → scheduler dropped: timer cleared, in-flight cycles abandoned
//! ```
//!
//! # Design Decisions
//! - Single broadcast channel; every long-running task subscribes
//! - Shutdown does not await outstanding poll work

pub mod shutdown;

pub use shutdown::Shutdown;
