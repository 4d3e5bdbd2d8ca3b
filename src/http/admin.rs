//! Poll scheduler control endpoints (protected).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::poller::SchedulerError;

#[derive(Debug, Deserialize)]
pub struct ForceParams {
    /// Scope the forced cycle to a single hostname; omit for the whole fleet.
    pub hostname: Option<String>,
}

fn rejected(e: SchedulerError) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
}

/// POST /api/admin/poller/start
pub async fn start_poller(State(state): State<AppState>) -> Response {
    match state.scheduler.start() {
        Ok(()) => Json(json!({ "message": "Auto-update started" })).into_response(),
        Err(e) => rejected(e),
    }
}

/// POST /api/admin/poller/stop
pub async fn stop_poller(State(state): State<AppState>) -> Response {
    match state.scheduler.stop() {
        Ok(()) => Json(json!({ "message": "Auto-update stopped" })).into_response(),
        Err(e) => rejected(e),
    }
}

/// GET /api/admin/poller/status
pub async fn poller_status(State(state): State<AppState>) -> Response {
    Json(state.scheduler.status()).into_response()
}

/// POST /api/admin/poller/force[?hostname=...]
///
/// Always completes with a per-target outcome list, even when every target
/// failed; only a roster read failure is structural.
pub async fn force_poll(
    State(state): State<AppState>,
    Query(params): Query<ForceParams>,
) -> Response {
    match state.scheduler.force_now(params.hostname.as_deref()).await {
        Ok(report) => Json(json!({
            "message": "Force update completed",
            "results": report.results,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "force update failed to read roster");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
