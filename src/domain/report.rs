//! Report types produced by sync runs and settlement attempts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::SyncError;

/// Stage of the sync pipeline an error was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    /// Chain log ingestion.
    Fetch,
    /// Reward computation and ledger accrual.
    Calculate,
    /// On-chain batch settlement.
    Settle,
    /// Run-statistics bookkeeping after the pipeline stages.
    Record,
}

/// A failure recorded during a sync run, with a machine-readable kind.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StageError {
    /// Pipeline stage that failed.
    pub stage: SyncStage,
    /// Stable machine-readable error kind.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl StageError {
    /// Records a [`SyncError`] against the given stage.
    #[must_use]
    pub fn from_error(stage: SyncStage, err: &SyncError) -> Self {
        Self {
            stage,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one settlement attempt.
///
/// `tx_hash` is `None` when there was nothing to settle (a valid no-op,
/// not an error).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    /// Number of users credited in the batch.
    pub user_count: u64,
    /// Total JXP submitted in the batch.
    pub total_jxp: u64,
    /// Hash of the confirmed settlement transaction.
    pub tx_hash: Option<String>,
}

impl SettlementOutcome {
    /// Outcome for an empty pending ledger: nothing submitted.
    #[must_use]
    pub const fn noop() -> Self {
        Self {
            user_count: 0,
            total_jxp: 0,
            tx_hash: None,
        }
    }
}

/// Full result of one orchestrator cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Genuinely new swap events ingested by the fetcher.
    pub fetched: u64,
    /// Events transitioned to processed by the calculator.
    pub processed: u64,
    /// Total JXP awarded this run.
    pub total_jxp_awarded: u64,
    /// Distinct users whose pending balance grew this run.
    pub users_updated: u64,
    /// Settlement outcome, absent when the settle stage never ran.
    pub settlement: Option<SettlementOutcome>,
    /// Stage failures recorded during the run.
    pub errors: Vec<StageError>,
}

impl SyncReport {
    /// True when every stage completed without a recorded failure.
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}
