//! Admin endpoints: manual settlement and direct JXP credits.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth;
use crate::api::dto::{AddJxpRequest, AddJxpResponse, ManualSettleResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SyncError};

/// `POST /admin/manual-settle` — Settle pending balances now.
///
/// # Errors
///
/// Returns [`SyncError`] on a bad admin key, a settlement already in
/// flight, or a failed settlement transaction.
#[utoipa::path(
    post,
    path = "/admin/manual-settle",
    tag = "Admin",
    summary = "Trigger settlement immediately",
    description = "Runs the batch settler outside the schedule. Rejected with 409 when \
                   another settlement is already in flight.",
    responses(
        (status = 200, description = "Settlement completed (or empty-ledger no-op)", body = ManualSettleResponse),
        (status = 401, description = "Bad or missing admin key", body = ErrorResponse),
        (status = 409, description = "Settlement already in flight", body = ErrorResponse),
        (status = 502, description = "Settlement transaction failed", body = ErrorResponse),
        (status = 504, description = "Confirmation timed out", body = ErrorResponse),
    ),
    security(("admin_key" = []))
)]
pub async fn manual_settle(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SyncError> {
    auth::require_admin_key(&headers, &state.config.admin_api_key)?;
    let outcome = state.orchestrator.run_settle_only().await?;
    Ok(Json(ManualSettleResponse::from(outcome)))
}

/// `POST /admin/add-jxp` — Credit JXP to one address directly.
///
/// Bypasses the pending ledger entirely: the credit goes straight to the
/// points contract and no store state changes.
///
/// # Errors
///
/// Returns [`SyncError`] on a bad admin key, an invalid address or
/// amount, or a failed credit transaction.
#[utoipa::path(
    post,
    path = "/admin/add-jxp",
    tag = "Admin",
    summary = "Credit JXP to an address",
    description = "Submits a single on-chain credit for the given address and waits for \
                   confirmation. The pending ledger is not touched.",
    request_body = AddJxpRequest,
    responses(
        (status = 200, description = "Credit confirmed", body = AddJxpResponse),
        (status = 400, description = "Invalid address or amount", body = ErrorResponse),
        (status = 401, description = "Bad or missing admin key", body = ErrorResponse),
        (status = 502, description = "Credit transaction failed", body = ErrorResponse),
    ),
    security(("admin_key" = []))
)]
pub async fn add_jxp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddJxpRequest>,
) -> Result<impl IntoResponse, SyncError> {
    auth::require_admin_key(&headers, &state.config.admin_api_key)?;

    if !is_hex_address(&req.address) {
        return Err(SyncError::Validation(format!(
            "invalid address: {}",
            req.address
        )));
    }
    if req.amount == 0 {
        return Err(SyncError::Validation(
            "amount must be a positive integer".to_string(),
        ));
    }

    let tx_hash = state.chain.credit_address(&req.address, req.amount).await?;
    tracing::info!(address = %req.address, amount = req.amount, %tx_hash, "manual JXP credit confirmed");

    Ok(Json(AddJxpResponse {
        success: true,
        tx_hash,
    }))
}

/// `0x` followed by exactly 40 hex digits.
fn is_hex_address(addr: &str) -> bool {
    addr.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/manual-settle", post(manual_settle))
        .route("/admin/add-jxp", post(add_jxp))
}
