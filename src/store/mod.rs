//! Roster/status store subsystem.
//!
//! # Data Flow
//! ```text
//! poll cycle ──▶ list() ──▶ fetcher (per target)
//! reconciler ──▶ mark_operational()/mark_error() ──▶ single-row UPDATE
//! HTTP API  ──▶ CRUD + aggregates
//! ```
//!
//! # Design Decisions
//! - SQLite via sqlx; one table, no migrations framework
//! - Every reconciler write is a single-row UPDATE, safe under
//!   concurrent cycles (last write wins)
//! - Credentials live in the row but never leave the process via the API

pub mod store;
pub mod types;

pub use store::{RosterStore, ServerEntry, StoreError};
pub use types::{LocationRow, StatsSummary, Status, Target};
