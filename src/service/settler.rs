//! Batch settler: pending ledger → on-chain credits.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::chain::ChainClient;
use crate::domain::SettlementOutcome;
use crate::error::SyncError;
use crate::persistence::SyncStore;

/// Reads the pending ledger and settles it on-chain in one batch.
///
/// Settlement is a two-phase protocol: (1) snapshot the pending set and
/// submit one batch-credit transaction, (2) after confirmation subtract
/// the exact submitted amounts in one atomic store batch. Accrual that
/// lands between the snapshot and the confirmation is therefore never
/// erased. A failed or timed-out transaction leaves the ledger
/// byte-for-byte unchanged.
#[derive(Debug)]
pub struct BatchSettler {
    store: Arc<dyn SyncStore>,
    chain: Arc<dyn ChainClient>,
    // Single-flight guard: two concurrent settlements could both read
    // the same pending snapshot and double-submit.
    in_flight: Mutex<()>,
}

impl BatchSettler {
    /// Creates a settler over the given store and chain.
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            store,
            chain,
            in_flight: Mutex::new(()),
        }
    }

    /// Settles all positive pending balances in one on-chain batch.
    ///
    /// An empty pending ledger is a successful no-op. The points
    /// contract applies the batch atomically, so a confirmed transaction
    /// means every included user was credited.
    ///
    /// # Errors
    ///
    /// [`SyncError::SettlementInFlight`] when another attempt holds the
    /// single-flight lock; [`SyncError::SettlementTx`] on rejection or
    /// revert and [`SyncError::SettlementTimeout`] on an ambiguous
    /// confirmation deadline; in all three cases the ledger is left
    /// untouched and the next run retries with the (possibly larger)
    /// pending set. [`SyncError::SettlementReconcile`] when the batch
    /// confirmed on-chain but the ledger subtraction failed: the ledger
    /// still holds the credited amounts and must be reconciled by the
    /// operator before settling again.
    pub async fn settle_pending_balances(&self) -> Result<SettlementOutcome, SyncError> {
        // The guard is held to completion or failure, never across a
        // scheduling boundary between runs.
        let Ok(_flight) = self.in_flight.try_lock() else {
            return Err(SyncError::SettlementInFlight);
        };

        let entries = self.store.pending_entries().await?;
        if entries.is_empty() {
            tracing::debug!("pending ledger empty, nothing to settle");
            return Ok(SettlementOutcome::noop());
        }

        let credits: Vec<(String, u64)> = entries
            .into_iter()
            .map(|entry| (entry.user, entry.pending_jxp))
            .collect();
        let total_jxp = credits.iter().map(|(_, jxp)| *jxp).sum::<u64>();
        let user_count = credits.len() as u64;

        let tx_hash = self.chain.submit_batch_credit(&credits).await?;
        tracing::info!(%tx_hash, user_count, total_jxp, "settlement batch submitted");

        self.chain.await_confirmation(&tx_hash).await?;

        // Confirmed: subtract exactly what was submitted, as one atomic
        // batch. Balances that grew since the snapshot keep their
        // surplus pending.
        if let Err(err) = self.store.subtract_settled(&credits, Utc::now()).await {
            tracing::error!(%tx_hash, %err, "settlement confirmed but ledger subtraction failed");
            return Err(SyncError::SettlementReconcile(tx_hash, err.to_string()));
        }

        tracing::info!(%tx_hash, user_count, total_jxp, "settlement confirmed and ledger cleared");
        Ok(SettlementOutcome {
            user_count,
            total_jxp,
            tx_hash: Some(tx_hash),
        })
    }
}
