//! Pending ledger entry: per-user accrued-but-unsettled JXP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user JXP balance awaiting on-chain settlement.
///
/// Created or incremented by the reward calculator as events are
/// processed, and decremented by the batch settler only after the
/// settlement transaction is confirmed. The balance never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLedgerEntry {
    /// User address (unique key).
    pub user: String,
    /// Accrued JXP not yet written to the chain.
    pub pending_jxp: u64,
    /// When the balance was last incremented or settled.
    pub last_updated: DateTime<Utc>,
}
