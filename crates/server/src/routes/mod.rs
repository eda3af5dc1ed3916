//! API route handlers
//!
//! - `health`: liveness and readiness
//! - `resolve`: document resolution and language lookup

pub mod health;
pub mod resolve;

use crate::error::ServerError;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// `GET /`, no authentication.
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "LexSrt Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/resolve",
            "/api/v1/languages/{code}",
            "/health",
            "/ready"
        ]
    }))
}

pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
