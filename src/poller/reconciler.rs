//! Reconciliation of fetch outcomes into persisted server status.
//!
//! # Responsibilities
//! - Success: status = operational, clients = fetched count, fresh timestamp
//! - Failure: status = error, fresh timestamp, clients gauge untouched
//!
//! # Design Decisions
//! - Writes are unconditional single-row overwrites (last write wins);
//!   no comparison against the previous status
//! - A failed write is logged and returned, never panicked on — one
//!   target's persistence failure must not take down a cycle

use crate::store::{RosterStore, StoreError};

/// Owns the state-transition policy for polled targets.
#[derive(Clone)]
pub struct Reconciler {
    store: RosterStore,
}

impl Reconciler {
    pub fn new(store: RosterStore) -> Self {
        Self { store }
    }

    /// A fetch succeeded: overwrite status and client gauge.
    pub async fn record_success(&self, hostname: &str, clients: i64) -> Result<(), StoreError> {
        self.store
            .mark_operational(hostname, clients)
            .await
            .inspect_err(|e| {
                tracing::error!(hostname, error = %e, "failed to persist operational status");
            })?;
        tracing::info!(hostname, clients, "server marked operational");
        Ok(())
    }

    /// A fetch exhausted its retries: mark error, keep the stale gauge so
    /// "known-bad with last known load" stays distinguishable from
    /// "never known".
    pub async fn record_failure(&self, hostname: &str) -> Result<(), StoreError> {
        self.store.mark_error(hostname).await.inspect_err(|e| {
            tracing::error!(hostname, error = %e, "failed to persist error status");
        })?;
        tracing::warn!(hostname, "server marked error");
        Ok(())
    }
}
