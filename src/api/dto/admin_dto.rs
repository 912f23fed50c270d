//! DTOs for the admin endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::SettlementOutcome;

/// Response of `POST /admin/manual-settle`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualSettleResponse {
    /// Whether the settlement attempt completed (true also for the
    /// empty-ledger no-op).
    pub success: bool,
    /// Number of users credited in the batch.
    pub user_count: u64,
    /// Total JXP submitted in the batch.
    #[serde(rename = "totalJXP")]
    pub total_jxp: u64,
    /// Hash of the confirmed settlement transaction.
    pub tx_hash: Option<String>,
}

impl From<SettlementOutcome> for ManualSettleResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            success: true,
            user_count: outcome.user_count,
            total_jxp: outcome.total_jxp,
            tx_hash: outcome.tx_hash,
        }
    }
}

/// Request body of `POST /admin/add-jxp`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddJxpRequest {
    /// Hex-encoded recipient address (`0x` + 40 hex digits).
    pub address: String,
    /// JXP amount to credit. Must be a positive integer.
    pub amount: u64,
}

/// Response of `POST /admin/add-jxp`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddJxpResponse {
    /// Always true on success.
    pub success: bool,
    /// Hash of the confirmed credit transaction.
    pub tx_hash: String,
}
