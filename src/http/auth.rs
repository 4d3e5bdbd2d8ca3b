//! Authentication middleware for the protected API surface.
//!
//! Two gates, both required: the client IP must be whitelisted and the
//! request must carry the configured key in `x-api-key`.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::server::AppState;

pub async fn require_operator(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = addr.ip();
    let whitelisted = state
        .security
        .allowed_ips
        .iter()
        .any(|allowed| allowed.parse::<IpAddr>().map_or(false, |ip| ip == client_ip));

    if !whitelisted {
        tracing::warn!(ip = %client_ip, "unauthorized IP access attempt");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "Access denied",
                "message": "Your IP is not whitelisted"
            })),
        )
            .into_response();
    }

    let api_key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    let key_ok = matches!(api_key, Some(key) if !state.security.api_key.is_empty()
        && key == state.security.api_key);

    if !key_ok {
        tracing::warn!(ip = %client_ip, "invalid API key attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Unauthorized",
                "message": "Invalid or missing API key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}
