use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;
use wikidata::CircuitState;

static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Liveness: 200 while the process is serving.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "lexsrt-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness: 503 while the Wikidata circuit breaker is open, since every
/// lookup would fail fast until it closes.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let (status, wikidata) = match state.circuit_state() {
        Some(CircuitState::Open) => (StatusCode::SERVICE_UNAVAILABLE, "open"),
        Some(CircuitState::HalfOpen) => (StatusCode::OK, "half_open"),
        Some(CircuitState::Closed) => (StatusCode::OK, "closed"),
        None => (StatusCode::OK, "scripted"),
    };
    let ready = status == StatusCode::OK;

    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "service": "lexsrt-server",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": uptime_seconds(),
            "components": {
                "api": "ready",
                "wikidata_circuit": wikidata,
            }
        })),
    )
}
