//! API server setup.
//!
//! # Responsibilities
//! - Create the Axum router with public, protected, and admin routes
//! - Wire up middleware (tracing, timeout, operator auth)
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{AppConfig, SecurityConfig};
use crate::http::{admin, auth, handlers};
use crate::poller::{PollCycle, PollScheduler};
use crate::store::RosterStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: RosterStore,
    pub scheduler: Arc<PollScheduler>,
    pub cycle: Arc<PollCycle>,
    pub security: SecurityConfig,
}

/// HTTP API server for the fleet monitor.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    pub fn new(
        config: &AppConfig,
        store: RosterStore,
        scheduler: Arc<PollScheduler>,
        cycle: Arc<PollCycle>,
    ) -> Self {
        let state = AppState {
            store,
            scheduler,
            cycle,
            security: config.security.clone(),
        };

        let router = Self::build_router(config, state);
        Self { router }
    }

    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let public = Router::new()
            .route("/api/servers/status", get(handlers::get_server_status))
            .route("/api/servers/locations", get(handlers::get_server_locations));

        let protected = Router::new()
            .route(
                "/api/servers",
                get(handlers::get_all_servers).post(handlers::add_server),
            )
            .route(
                "/api/servers/stats/summary",
                get(handlers::get_stats_summary),
            )
            .route(
                "/api/servers/{hostname}",
                get(handlers::get_server_by_hostname)
                    .put(handlers::update_server)
                    .delete(handlers::delete_server),
            )
            .route("/api/admin/poller/start", post(admin::start_poller))
            .route("/api/admin/poller/stop", post(admin::stop_poller))
            .route("/api/admin/poller/status", get(admin::poller_status))
            .route("/api/admin/poller/force", post(admin::force_poll))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_operator,
            ));

        public
            .merge(protected)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "API server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}
