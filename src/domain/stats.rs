//! Singleton system statistics record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Process-wide singleton stats, stored under the key `"global"`.
///
/// Updated at the end of every orchestrator cycle under the same per-run
/// mutual exclusion as the rest of the sync (single orchestrator
/// instance, no concurrent writer). Also carries the durable
/// last-synced-block cursor so the fetch position survives restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    /// When the last full sync run finished.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// When the next scheduled sync run is due.
    pub next_sync_at: Option<DateTime<Utc>>,
    /// Cumulative count of processed swap events.
    pub total_processed_swaps: u64,
    /// Cumulative JXP awarded across all runs.
    pub total_jxp_awarded: u64,
    /// Highest block whose logs have been fully ingested.
    pub last_synced_block: Option<u64>,
}
