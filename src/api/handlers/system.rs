//! System endpoints: health check and sync statistics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::SystemStats;
use crate::error::{ErrorResponse, SyncError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /stats` — Aggregated sync statistics.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] when the store is unavailable.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "System",
    summary = "Sync statistics",
    description = "Returns last/next sync times, lifetime processed-swap and awarded-JXP \
                   totals, and the durable block cursor.",
    responses(
        (status = 200, description = "Current statistics", body = SystemStats),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn stats_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, SyncError> {
    let stats = state.store.system_stats().await?;
    Ok(Json(stats))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
}
