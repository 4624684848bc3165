//! Liveness and readiness probes

use crate::{db, middleware::AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Record process start; called once from main.
pub fn set_start_time() {
    let _ = START_TIME.set(Instant::now());
}

pub async fn health_check() -> impl IntoResponse {
    let uptime_secs = START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0);

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime_secs,
    }))
}

pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    db::record_pool_metrics(&state.db);

    match db::health_check(&state.db).await {
        db::HealthStatus::Healthy => {
            (StatusCode::OK, Json(json!({"status": "ready"}))).into_response()
        }
        db::HealthStatus::Unhealthy(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not ready"})),
        )
            .into_response(),
    }
}
