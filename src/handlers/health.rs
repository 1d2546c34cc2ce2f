//! Health and readiness endpoints

use crate::{db, middleware::AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /ready
///
/// Ready only when the database answers a ping.
pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match db::health_check(&state.db).await {
        db::HealthStatus::Healthy => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        db::HealthStatus::Unhealthy(reason) => {
            tracing::warn!(reason = %reason, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "reason": reason })),
            )
        }
    }
}
