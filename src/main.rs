//! VPN Fleet Monitor
//!
//! Tracks the operational state of a fleet of OpenVPN Access Server hosts by
//! periodically SSHing into each one, reading the live client count from
//! `sacli VPNSummary`, and reconciling the outcome into a SQLite roster.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                    VPN FLEET MONITOR                  │
//!                   │                                                       │
//!   timer tick      │  ┌───────────┐   ┌────────┐   ┌─────────┐            │
//!   ────────────────┼─▶│ scheduler │──▶│ cycle  │──▶│ fetcher │──▶ SSH ────┼──▶ VPN host
//!                   │  └───────────┘   └────┬───┘   └────┬────┘            │
//!                   │        ▲              │            │ n_clients       │
//!                   │        │              ▼            ▼                  │
//!   admin request   │  ┌───────────┐   ┌────────────┐   ┌───────┐          │
//!   ────────────────┼─▶│ HTTP API  │   │ reconciler │──▶│ store │ (SQLite) │
//!                   │  └───────────┘   └────────────┘   └───────┘          │
//!                   │                                                       │
//!                   │  ┌─────────────────────────────────────────────────┐ │
//!                   │  │           Cross-Cutting Concerns                 │ │
//!                   │  │  ┌────────┐ ┌──────────────┐ ┌───────────────┐  │ │
//!                   │  │  │ config │ │ tracing logs │ │   lifecycle   │  │ │
//!                   │  │  └────────┘ └──────────────┘ └───────────────┘  │ │
//!                   │  └─────────────────────────────────────────────────┘ │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vpnwatch::config::loader::load_config;
use vpnwatch::config::AppConfig;
use vpnwatch::fetcher::{MetricFetcher, SshTransport};
use vpnwatch::http::ApiServer;
use vpnwatch::lifecycle::Shutdown;
use vpnwatch::poller::{PollCycle, PollScheduler};
use vpnwatch::store::RosterStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vpnwatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("vpnwatch v{} starting", env!("CARGO_PKG_VERSION"));

    // Load configuration; a missing file means defaults.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => {
            let default_path = Path::new("vpnwatch.toml");
            if default_path.exists() {
                load_config(default_path)?
            } else {
                AppConfig::default()
            }
        }
    };

    tracing::info!(
        bind_address = %config.server.bind_address,
        store_path = %config.store.path,
        interval_ms = config.poller.interval_ms,
        auto_update = config.poller.enabled,
        "Configuration loaded"
    );

    // Open the roster store
    let store = RosterStore::open(&config.store.path).await?;
    if !store.check_connection().await {
        tracing::error!("roster store connectivity probe failed");
    }

    // Wire the polling engine
    let transport = Arc::new(SshTransport::new(&config.ssh));
    let fetcher = Arc::new(MetricFetcher::new(
        transport,
        Duration::from_millis(config.poller.base_delay_ms),
    ));
    let cycle = Arc::new(PollCycle::new(
        store.clone(),
        fetcher,
        config.poller.max_attempts,
        config.poller.concurrency,
    ));
    let scheduler = Arc::new(PollScheduler::new(
        cycle.clone(),
        Duration::from_millis(config.poller.interval_ms),
        config.poller.enabled,
    ));

    // Bind the API listener before starting the scheduler so operators can
    // reach the control surface as soon as polling begins.
    let listener = TcpListener::bind(&config.server.bind_address).await?;

    if scheduler.auto_start_enabled() {
        // Cannot fail on a fresh scheduler; log anyway rather than unwrap.
        if let Err(e) = scheduler.start() {
            tracing::error!(error = %e, "auto-start failed");
        }
    } else {
        tracing::info!("auto-update is disabled; waiting for operator start");
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = ApiServer::new(&config, store, scheduler, cycle);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
