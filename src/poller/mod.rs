//! Fleet polling and reconciliation engine.
//!
//! # Data Flow
//! ```text
//! scheduler.rs (recurring timer, start/stop/force)
//!     → cycle.rs (roster read, bounded fan-out, per-target isolation)
//!         → fetcher (SSH + retries, per target)
//!         → reconciler.rs (status/clients write, per target)
//!             → store (single-row UPDATE)
//!     → CycleReport (ephemeral, returned to the caller)
//! ```
//!
//! # Design Decisions
//! - One armed timer per process; arming disarms any predecessor
//! - Ticks spawn cycles without awaiting the previous one; overlap is
//!   tolerated because reconciliation is idempotent last-write-wins
//! - Stopping disarms future ticks only; in-flight cycles run to completion

pub mod cycle;
pub mod reconciler;
pub mod scheduler;

pub use cycle::{CycleReport, PollCycle, TargetOutcome};
pub use reconciler::Reconciler;
pub use scheduler::{PollScheduler, SchedulerError, SchedulerStatus};
