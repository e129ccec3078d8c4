//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::response::HealthResponse;
use crate::state::AppState;

/// Pings the store and records the outcome in the health registry.
async fn check_store(state: &AppState) -> bool {
    match state.store.ping().await {
        Ok(()) => {
            state.health.store.set_healthy();
            true
        }
        Err(e) => {
            warn!(backend = state.store.backend_name(), error = %e, "Store ping failed");
            state.health.store.set_unhealthy(e.to_string());
            false
        }
    }
}

/// GET /health - Full health check.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = check_store(&state).await;
    let report = state.health.report();

    Json(HealthResponse {
        status: report.status.as_str().to_string(),
        store_backend: state.store.backend_name(),
        store_connected,
        metrics: state.metrics.snapshot(),
    })
}

/// GET /health/ready - Readiness check (can accept traffic).
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    check_store(&state).await;
    if state.health.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness check (process is serving requests).
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
