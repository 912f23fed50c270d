//! Sync trigger endpoints, called by the external cron scheduler.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth;
use crate::api::dto::{FetchEventsResponse, FullSyncResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SyncError};

/// `POST /sync/fetch-events` — Ingest new swap events only.
///
/// # Errors
///
/// Returns [`SyncError`] on a bad cron secret or a fetch failure.
#[utoipa::path(
    post,
    path = "/sync/fetch-events",
    tag = "Sync",
    summary = "Fetch new swap events",
    description = "Queries the chain for swap events since the durable block cursor and \
                   stores the new ones. Reward calculation and settlement do not run.",
    responses(
        (status = 200, description = "Fetch pass completed", body = FetchEventsResponse),
        (status = 401, description = "Bad or missing cron secret", body = ErrorResponse),
        (status = 502, description = "Chain RPC unavailable", body = ErrorResponse),
    ),
    security(("cron_secret" = []))
)]
pub async fn fetch_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SyncError> {
    auth::require_cron_secret(&headers, &state.config.cron_secret)?;
    let outcome = state.orchestrator.run_fetch_only().await?;
    Ok(Json(FetchEventsResponse::from(outcome)))
}

/// `POST /sync/full` — Run a full Fetch → Calculate → Settle cycle.
///
/// Stage failures inside the cycle are reported in the body, not as an
/// HTTP error: the run itself always completes.
///
/// # Errors
///
/// Returns [`SyncError::Unauthorized`] on a bad cron secret.
#[utoipa::path(
    post,
    path = "/sync/full",
    tag = "Sync",
    summary = "Run a full sync cycle",
    description = "Fetches new swap events, awards JXP into the pending ledger, and \
                   settles pending balances on-chain. Concurrent triggers queue.",
    responses(
        (status = 200, description = "Cycle completed (possibly with stage errors)", body = FullSyncResponse),
        (status = 401, description = "Bad or missing cron secret", body = ErrorResponse),
    ),
    security(("cron_secret" = []))
)]
pub async fn full_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SyncError> {
    auth::require_cron_secret(&headers, &state.config.cron_secret)?;
    let report = state.orchestrator.run_full_sync().await;
    Ok(Json(FullSyncResponse::from(report)))
}

/// Sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/fetch-events", post(fetch_events))
        .route("/sync/full", post(full_sync))
}
