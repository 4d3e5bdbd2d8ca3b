//! Roster row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted health state of a target.
///
/// # State Transitions
/// ```text
/// pending ──success──▶ operational      (first poll resolves)
/// pending ──exhausted─▶ error
/// operational ◀──────▶ error            (each poll overwrites)
/// ```
///
/// There is no partial/degraded state; a target is binary healthy/unhealthy
/// as of its last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Operational,
    Error,
}

/// One remote VPN server tracked by the fleet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Target {
    pub id: String,
    pub hostname: String,
    pub ip: String,
    pub country: String,
    pub city: String,
    pub status: Status,
    pub clients: i64,
    pub last_updated: Option<DateTime<Utc>>,
    pub username: String,
    pub password: String,
}

/// Aggregate row for the public locations endpoint.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LocationRow {
    pub country: String,
    pub city: String,
    pub server_count: i64,
}

/// Fleet-wide statistics summary.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatsSummary {
    pub total_servers: i64,
    pub operational_servers: i64,
    pub total_clients: i64,
    pub average_clients_per_server: f64,
}
