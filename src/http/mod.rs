//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → TraceLayer / TimeoutLayer
//!     → public routes (status, locations)           no auth
//!     → protected routes (CRUD, stats, poller)      auth.rs: IP whitelist + api key
//!     → handlers.rs / admin.rs
//!     → store / scheduler
//! ```
//!
//! # Design Decisions
//! - Auth is applied to the protected sub-router, not per-path checks
//! - Credentials never appear in any response shape
//! - Scheduler state errors map to 400, unknown hostnames to 404,
//!   store failures to 500

pub mod admin;
pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{ApiServer, AppState};
