//! Roster CRUD and read-only fleet views.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::store::{ServerEntry, Status, StoreError, Target};

/// Full server view for operators. Credentials are deliberately absent.
#[derive(Debug, Serialize)]
pub struct ServerView {
    pub hostname: String,
    pub ip: String,
    pub country: String,
    pub city: String,
    pub status: Status,
    pub clients: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<Target> for ServerView {
    fn from(t: Target) -> Self {
        Self {
            hostname: t.hostname,
            ip: t.ip,
            country: t.country,
            city: t.city,
            status: t.status,
            clients: t.clients,
            last_updated: t.last_updated,
        }
    }
}

/// Public server view: no address, no credentials.
#[derive(Debug, Serialize)]
pub struct PublicServerView {
    pub hostname: String,
    pub country: String,
    pub city: String,
    pub status: Status,
    pub last_updated: Option<DateTime<Utc>>,
    pub clients: i64,
}

impl From<Target> for PublicServerView {
    fn from(t: Target) -> Self {
        Self {
            hostname: t.hostname,
            country: t.country,
            city: t.city,
            status: t.status,
            last_updated: t.last_updated,
            clients: t.clients,
        }
    }
}

fn internal_error(e: StoreError) -> Response {
    tracing::error!(error = %e, "store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Server not found" })),
    )
        .into_response()
}

fn validate_entry(entry: &ServerEntry) -> Result<(), Response> {
    let mut problems = Vec::new();
    if entry.hostname.trim().is_empty() {
        problems.push("hostname must not be empty");
    }
    if entry.ip.parse::<std::net::IpAddr>().is_err() {
        problems.push("ip must be a valid IP address");
    }
    if entry.username.trim().is_empty() {
        problems.push("username must not be empty");
    }
    if entry.password.is_empty() {
        problems.push("password must not be empty");
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": problems.join(", ") })),
        )
            .into_response())
    }
}

/// GET /api/servers (protected)
pub async fn get_all_servers(State(state): State<AppState>) -> Response {
    match state.store.list().await {
        Ok(targets) => {
            let views: Vec<ServerView> = targets.into_iter().map(ServerView::from).collect();
            Json(views).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /api/servers/status (public)
pub async fn get_server_status(State(state): State<AppState>) -> Response {
    match state.store.operational().await {
        Ok(targets) => {
            let views: Vec<PublicServerView> =
                targets.into_iter().map(PublicServerView::from).collect();
            Json(views).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /api/servers/locations (public)
pub async fn get_server_locations(State(state): State<AppState>) -> Response {
    match state.store.locations().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/servers/stats/summary (protected)
pub async fn get_stats_summary(State(state): State<AppState>) -> Response {
    match state.store.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/servers/{hostname} (protected)
pub async fn get_server_by_hostname(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
) -> Response {
    match state.store.get(&hostname).await {
        Ok(Some(target)) => Json(ServerView::from(target)).into_response(),
        Ok(None) => not_found(),
        Err(e) => internal_error(e),
    }
}

/// POST /api/servers (protected)
///
/// Registers the server in `pending` state, then polls it once in the
/// background so its first data point does not wait for the next cycle.
pub async fn add_server(
    State(state): State<AppState>,
    Json(entry): Json<ServerEntry>,
) -> Response {
    if let Err(rejection) = validate_entry(&entry) {
        return rejection;
    }

    let server_id = match state.store.insert(&entry).await {
        Ok(id) => id,
        Err(StoreError::DuplicateHostname) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Server with this hostname already exists" })),
            )
                .into_response();
        }
        Err(e) => return internal_error(e),
    };

    spawn_initial_poll(&state, entry.hostname.clone());

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Server added successfully",
            "server_id": server_id
        })),
    )
        .into_response()
}

/// PUT /api/servers/{hostname} (protected)
pub async fn update_server(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
    Json(entry): Json<ServerEntry>,
) -> Response {
    if let Err(rejection) = validate_entry(&entry) {
        return rejection;
    }

    match state.store.update(&hostname, &entry).await {
        Ok(true) => {
            spawn_initial_poll(&state, hostname);
            Json(json!({ "message": "Server updated successfully" })).into_response()
        }
        Ok(false) => not_found(),
        Err(e) => internal_error(e),
    }
}

/// DELETE /api/servers/{hostname} (protected)
pub async fn delete_server(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
) -> Response {
    match state.store.delete(&hostname).await {
        Ok(true) => Json(json!({ "message": "Server deleted successfully" })).into_response(),
        Ok(false) => not_found(),
        Err(e) => internal_error(e),
    }
}

/// Best-effort single-target poll after create/update. Failures are already
/// reconciled into the stored status, so the request does not wait on it.
fn spawn_initial_poll(state: &AppState, hostname: String) {
    let cycle = state.cycle.clone();
    tokio::spawn(async move {
        if let Err(e) = cycle.run_one(&hostname).await {
            tracing::error!(hostname, error = %e, "initial poll failed");
        }
    });
}
