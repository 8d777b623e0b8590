//! Health, readiness, and metrics endpoints.
//!
//! - `GET /health` — liveness only, always 200 while the process is running.
//! - `GET /ready` — checks the database pool and the tenant store, 503 if
//!   either is unreachable.
//! - `GET /metrics` — Prometheus text exposition of everything registered on
//!   `AppState::metrics_registry`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive", body = Object)),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "services": {
            "api": "up",
        },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Deep dependency check: the database pool via `Database::check_health`,
/// and a lightweight `SELECT 1` through `TenantStore::health_check` (the
/// latter is retried internally on a transient connection failure, per
/// §4.1's store failure semantics, so a single blip doesn't flip readiness).
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Service is ready", body = Object),
        (status = 503, description = "Service is not ready", body = Object)
    ),
    tag = "health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_pool_healthy = match state.db.check_health().await {
        Ok(_) => true,
        Err(e) => {
            error!("database pool health check failed: {}", e);
            false
        }
    };

    let tenant_store_healthy = match state.store.health_check().await {
        Ok(_) => true,
        Err(e) => {
            error!("tenant store health check failed: {}", e);
            false
        }
    };

    let is_ready = database_pool_healthy && tenant_store_healthy;
    let status = if is_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "ready": is_ready,
            "checks": {
                "database": database_pool_healthy,
                "store": tenant_store_healthy,
            }
        })),
    )
}

/// Prometheus text exposition format, scraped by the metrics stack rather
/// than by a human — no `utoipa::path` since it isn't JSON.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.get_metrics(),
    )
}
