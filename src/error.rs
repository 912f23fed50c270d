//! Sync engine error types with HTTP status code mapping.
//!
//! [`SyncError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response,
//! and carries a stable machine-readable kind string used in sync reports.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "kind": "chain_query_failure",
///     "message": "chain query failed: RPC unreachable",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code, kind, and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`SyncError`]).
    pub code: u32,
    /// Stable machine-readable error kind.
    pub kind: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// Per-stage failures never corrupt already-committed state: nothing is
/// written speculatively, so no variant implies a rollback.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                  |
/// |-----------|-------------------|------------------------------|
/// | 1000–1999 | Validation / Auth | 400 Bad Request / 401        |
/// | 2000–2999 | State / Conflict  | 409 Conflict                 |
/// | 3000–3999 | Server            | 500 Internal Server Error    |
/// | 4000–4999 | Upstream Chain    | 502 Bad Gateway / 504        |
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Chain RPC was unreachable or timed out during a log query.
    /// Retried on the next cycle; no state was mutated.
    #[error("chain query failed: {0}")]
    ChainQuery(String),

    /// A raw log could not be decoded into a swap event. The fetcher
    /// skips and logs these; it only surfaces as an error when a whole
    /// response is malformed.
    #[error("failed to decode swap log: {0}")]
    Decode(String),

    /// Document store unavailable or a query failed. The current stage
    /// aborts with state unchanged and is retried next cycle.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Settlement transaction was rejected on submission or reverted
    /// on-chain. The pending ledger is left untouched.
    #[error("settlement transaction failed: {0}")]
    SettlementTx(String),

    /// Timed out waiting for settlement confirmation. Ambiguous outcome:
    /// the ledger is left untouched and the operator must reconcile
    /// manually if the transaction actually landed.
    #[error("timed out waiting for settlement confirmation of tx {0}")]
    SettlementTimeout(String),

    /// Settlement confirmed on-chain but the ledger subtraction failed.
    /// No balance in the batch was subtracted. Same ambiguity class as a
    /// timeout: the operator must reconcile the confirmed transaction
    /// against the still-pending balances before settling again.
    #[error("settlement tx {0} confirmed but ledger subtraction failed: {1}")]
    SettlementReconcile(String, String),

    /// Another settlement attempt is already in flight.
    #[error("a settlement is already in flight")]
    SettlementInFlight,

    /// Bad or missing shared secret. The request is rejected without
    /// revealing which secret was expected.
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed address or amount in a request, rejected before any
    /// chain or store access.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Unauthorized => 1002,
            Self::SettlementInFlight => 2001,
            Self::Persistence(_) => 3001,
            Self::Internal(_) => 3000,
            Self::ChainQuery(_) => 4001,
            Self::Decode(_) => 4002,
            Self::SettlementTx(_) => 4003,
            Self::SettlementTimeout(_) => 4004,
            Self::SettlementReconcile(_, _) => 4005,
        }
    }

    /// Returns the stable machine-readable kind string for this variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ChainQuery(_) => "chain_query_failure",
            Self::Decode(_) => "decode_failure",
            Self::Persistence(_) => "persistence_failure",
            Self::SettlementTx(_) => "settlement_tx_failure",
            Self::SettlementTimeout(_) => "settlement_confirmation_timeout",
            Self::SettlementReconcile(_, _) => "settlement_reconciliation_required",
            Self::SettlementInFlight => "settlement_in_flight",
            Self::Unauthorized => "authorization_failure",
            Self::Validation(_) => "validation_failure",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::SettlementInFlight => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) | Self::SettlementReconcile(_, _) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ChainQuery(_) | Self::Decode(_) | Self::SettlementTx(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::SettlementTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                kind: self.kind(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
