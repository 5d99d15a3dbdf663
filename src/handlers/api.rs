use axum::{Json, response::IntoResponse};
use serde_json::json;

/// Service banner at `/`
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "service": "voxgate",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}

/// Liveness probe at `/healthz`
pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}
