//! One pass over the fleet roster.
//!
//! # Responsibilities
//! - Re-read the roster at cycle start (roster edits between cycles are
//!   picked up automatically)
//! - Fetch + reconcile every target with per-target failure isolation
//! - Aggregate per-target outcomes into an ephemeral report
//!
//! # Design Decisions
//! - Bounded fan-out via a semaphore; the permit count is configuration,
//!   not a hardcoded limit
//! - No ordering guarantees among targets; the cycle completes only when
//!   every target reached a terminal reconciler call
//! - The report is returned to the caller and never persisted

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetcher::MetricFetcher;
use crate::poller::reconciler::Reconciler;
use crate::store::{RosterStore, StoreError, Target};

/// Terminal result for one target within a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub hostname: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetOutcome {
    pub fn updated(hostname: &str, clients: i64) -> Self {
        Self {
            hostname: hostname.to_string(),
            status: "updated",
            clients: Some(clients),
            error: None,
        }
    }

    pub fn error(hostname: &str, message: String) -> Self {
        Self {
            hostname: hostname.to_string(),
            status: "error",
            clients: None,
            error: Some(message),
        }
    }

    pub fn not_found(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            status: "not_found",
            clients: None,
            error: Some("server not found".to_string()),
        }
    }
}

/// Ephemeral aggregate of one poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub results: Vec<TargetOutcome>,
}

impl CycleReport {
    pub fn single(started_at: DateTime<Utc>, outcome: TargetOutcome) -> Self {
        Self {
            started_at,
            results: vec![outcome],
        }
    }

    pub fn updated_count(&self) -> usize {
        self.results.iter().filter(|o| o.status == "updated").count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|o| o.status != "updated").count()
    }
}

/// Drives fetch + reconcile across the whole roster.
#[derive(Clone)]
pub struct PollCycle {
    store: RosterStore,
    fetcher: Arc<MetricFetcher>,
    reconciler: Reconciler,
    max_attempts: u32,
    concurrency: usize,
}

impl PollCycle {
    pub fn new(
        store: RosterStore,
        fetcher: Arc<MetricFetcher>,
        max_attempts: u32,
        concurrency: usize,
    ) -> Self {
        let reconciler = Reconciler::new(store.clone());
        Self {
            store,
            fetcher,
            reconciler,
            max_attempts,
            concurrency: concurrency.max(1),
        }
    }

    /// Poll every registered target. Only a roster read failure is
    /// structural; per-target failures land in the report.
    pub async fn run(&self) -> Result<CycleReport, StoreError> {
        let started_at = Utc::now();
        let targets = self.store.list().await?;

        tracing::info!(targets = targets.len(), "poll cycle starting");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for target in targets {
            let cycle = self.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                cycle.poll_one(target).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => results.push(outcome),
                // A panicked poll task loses its report entry but must not
                // abort the remaining targets.
                Err(e) => tracing::error!(error = %e, "poll task aborted"),
            }
        }

        let report = CycleReport {
            started_at,
            results,
        };
        tracing::info!(
            updated = report.updated_count(),
            errors = report.error_count(),
            "poll cycle completed"
        );
        Ok(report)
    }

    /// Poll a single target by hostname. Unknown hostnames produce a
    /// not-found outcome rather than an error.
    pub async fn run_one(&self, hostname: &str) -> Result<TargetOutcome, StoreError> {
        match self.store.get(hostname).await? {
            Some(target) => Ok(self.poll_one(target).await),
            None => Ok(TargetOutcome::not_found(hostname)),
        }
    }

    /// Fetch one target and feed the outcome to the reconciler. Always
    /// reaches a terminal reconciler call; never propagates fetch errors.
    async fn poll_one(&self, target: Target) -> TargetOutcome {
        match self.fetcher.fetch(&target, self.max_attempts).await {
            Ok(clients) => {
                match self.reconciler.record_success(&target.hostname, clients).await {
                    Ok(()) => TargetOutcome::updated(&target.hostname, clients),
                    Err(e) => TargetOutcome::error(
                        &target.hostname,
                        format!("status write failed: {e}"),
                    ),
                }
            }
            Err(fetch_error) => {
                if let Err(e) = self.reconciler.record_failure(&target.hostname).await {
                    return TargetOutcome::error(
                        &target.hostname,
                        format!("{fetch_error}; status write failed: {e}"),
                    );
                }
                TargetOutcome::error(&target.hostname, fetch_error.to_string())
            }
        }
    }
}
