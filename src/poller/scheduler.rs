//! Recurring poll scheduler.
//!
//! # States
//! ```text
//! Stopped ──start()──▶ Running     (immediate cycle, then interval ticks)
//! Running ──stop()───▶ Stopped     (timer disarmed, in-flight cycles finish)
//! Running ──start()──▶ error: already running
//! Stopped ──stop()───▶ error: not running
//! force_now() valid in any state; never touches the timer
//! ```
//!
//! `enabled = false` in configuration only suppresses the automatic start at
//! boot; operator start/stop calls work regardless.
//!
//! # Design Decisions
//! - The timer handle lives in a private field behind a mutex, not in
//!   process-global state; at most one timer is armed per scheduler
//! - Arming disarms any predecessor handle first
//! - Each tick spawns its cycle and does not await it; slow fleets may
//!   overlap cycles, which the last-write-wins reconciler absorbs

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::poller::cycle::{CycleReport, PollCycle};
use crate::store::StoreError;

/// Invalid start/stop transitions, surfaced to the operator as rejected
/// operations rather than logged as system faults.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("auto-update is already running")]
    AlreadyRunning,

    #[error("auto-update is not running")]
    NotRunning,
}

/// Snapshot of the scheduler for the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_ms: u64,
    pub enabled: bool,
    pub next_update: Option<DateTime<Utc>>,
}

/// Owns the single recurring timer that drives fleet poll cycles.
pub struct PollScheduler {
    cycle: Arc<PollCycle>,
    interval: Duration,
    enabled: bool,
    timer: Mutex<Option<JoinHandle<()>>>,
    next_tick: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl PollScheduler {
    pub fn new(cycle: Arc<PollCycle>, interval: Duration, enabled: bool) -> Self {
        Self {
            cycle,
            interval,
            enabled,
            timer: Mutex::new(None),
            next_tick: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether configuration asks for an automatic start at boot.
    pub fn auto_start_enabled(&self) -> bool {
        self.enabled
    }

    /// Arm the timer and run one immediate cycle before the first tick.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut slot = self.timer.lock().expect("scheduler timer mutex poisoned");

        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(SchedulerError::AlreadyRunning);
        }
        // Disarm-before-rearm: a finished or aborted predecessor handle must
        // not linger next to a fresh timer.
        if let Some(stale) = slot.take() {
            stale.abort();
        }

        let cycle = self.cycle.clone();
        let interval = self.interval;
        let next_tick = self.next_tick.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                // First tick fires immediately: the first data point does not
                // wait a full interval.
                ticker.tick().await;
                *next_tick.lock().expect("next-tick mutex poisoned") =
                    Some(Utc::now() + chrono::Duration::milliseconds(interval.as_millis() as i64));

                let cycle = cycle.clone();
                tokio::spawn(async move {
                    match cycle.run().await {
                        Ok(report) => tracing::info!(
                            updated = report.updated_count(),
                            errors = report.error_count(),
                            "scheduled poll cycle completed"
                        ),
                        Err(e) => tracing::error!(error = %e, "scheduled poll cycle failed"),
                    }
                });
            }
        });

        *slot = Some(handle);
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "poll scheduler started");
        Ok(())
    }

    /// Disarm the timer. In-flight cycles are not cancelled.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let mut slot = self.timer.lock().expect("scheduler timer mutex poisoned");
        match slot.take() {
            Some(handle) => {
                handle.abort();
                *self.next_tick.lock().expect("next-tick mutex poisoned") = None;
                tracing::info!("poll scheduler stopped");
                Ok(())
            }
            None => Err(SchedulerError::NotRunning),
        }
    }

    /// Report running state, configured interval, config flag, and the
    /// projected next tick.
    pub fn status(&self) -> SchedulerStatus {
        let slot = self.timer.lock().expect("scheduler timer mutex poisoned");
        let running = slot.as_ref().is_some_and(|h| !h.is_finished());
        let next_update = if running {
            *self.next_tick.lock().expect("next-tick mutex poisoned")
        } else {
            None
        };
        SchedulerStatus {
            running,
            interval_ms: self.interval.as_millis() as u64,
            enabled: self.enabled,
            next_update,
        }
    }

    /// Run one out-of-band cycle, fleet-wide or scoped to one hostname.
    /// Valid in any state and does not touch the armed timer.
    pub async fn force_now(&self, hostname: Option<&str>) -> Result<CycleReport, StoreError> {
        match hostname {
            None => self.cycle.run().await,
            Some(hostname) => {
                let started_at = Utc::now();
                let outcome = self.cycle.run_one(hostname).await?;
                Ok(CycleReport::single(started_at, outcome))
            }
        }
    }
}

impl Drop for PollScheduler {
    // Teardown clears the timer without awaiting outstanding work.
    fn drop(&mut self) {
        if let Ok(mut slot) = self.timer.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
