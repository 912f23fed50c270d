//! DTOs for the sync trigger endpoints.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{StageError, SyncReport};
use crate::service::FetchOutcome;

/// Response of `POST /sync/fetch-events`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchEventsResponse {
    /// Whether the fetch pass completed.
    pub success: bool,
    /// Genuinely new swap events stored by this pass.
    pub new_swaps_count: u64,
}

impl From<FetchOutcome> for FetchEventsResponse {
    fn from(outcome: FetchOutcome) -> Self {
        Self {
            success: true,
            new_swaps_count: outcome.new_events,
        }
    }
}

/// Response of `POST /sync/full`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FullSyncResponse {
    /// Whether every stage completed without a recorded failure.
    pub success: bool,
    /// Identifier of the underlying run.
    pub run_id: Uuid,
    /// Events transitioned to processed this run.
    pub processed_count: u64,
    /// Total JXP awarded this run.
    #[serde(rename = "totalJXPAwarded")]
    pub total_jxp_awarded: u64,
    /// Distinct users whose pending balance grew this run.
    pub users_updated: u64,
    /// Hash of the confirmed settlement transaction, if one was sent.
    pub blockchain_tx_hash: Option<String>,
    /// Whether the on-chain settlement succeeded (true also for the
    /// empty-ledger no-op).
    pub blockchain_update_success: bool,
    /// Stage failures recorded during the run.
    pub errors: Vec<StageError>,
}

impl From<SyncReport> for FullSyncResponse {
    fn from(report: SyncReport) -> Self {
        let success = report.success();
        Self {
            success,
            run_id: report.run_id,
            processed_count: report.processed,
            total_jxp_awarded: report.total_jxp_awarded,
            users_updated: report.users_updated,
            blockchain_tx_hash: report
                .settlement
                .as_ref()
                .and_then(|s| s.tx_hash.clone()),
            blockchain_update_success: report.settlement.is_some(),
            errors: report.errors,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn full_sync_response_uses_exact_jxp_field_name() {
        let report = SyncReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            fetched: 1,
            processed: 1,
            total_jxp_awarded: 10,
            users_updated: 1,
            settlement: None,
            errors: Vec::new(),
        };
        let json = serde_json::to_value(FullSyncResponse::from(report)).unwrap();
        assert_eq!(json["totalJXPAwarded"], 10);
        assert_eq!(json["processedCount"], 1);
        assert_eq!(json["blockchainUpdateSuccess"], false);
    }
}
