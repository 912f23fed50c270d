//! The `ChainClient` trait and raw log type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::U256;

use crate::error::SyncError;

/// A normalized swap log as returned by the chain, before persistence.
///
/// Token direction has already been resolved against the pool's token
/// pair; amounts are raw smallest-unit integers.
#[derive(Debug, Clone)]
pub struct RawSwapLog {
    /// Transaction hash of the emitting transaction.
    pub tx_hash: String,
    /// Log index within the transaction receipt.
    pub log_index: u64,
    /// Block the log was emitted in.
    pub block_number: u64,
    /// Block timestamp.
    pub timestamp: DateTime<Utc>,
    /// Swap beneficiary address.
    pub user: String,
    /// Token sold into the pool.
    pub token_in: String,
    /// Token bought from the pool.
    pub token_out: String,
    /// Raw input amount.
    pub amount_in: U256,
    /// Raw output amount.
    pub amount_out: U256,
}

/// Chain access consumed by the sync engine.
///
/// Three capabilities, mirroring the external contract surface: a log
/// query for a block range, transaction submission for credits, and
/// confirmation polling for a submitted hash. All calls are time-bounded
/// by the implementation; a timeout is a failure, never a success.
#[async_trait]
pub trait ChainClient: Send + Sync + std::fmt::Debug {
    /// Returns the current chain head block number.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChainQuery`] when the RPC is unreachable or times out.
    async fn latest_block(&self) -> Result<u64, SyncError>;

    /// Fetches and decodes swap logs for the configured pool contracts
    /// in the inclusive block range.
    ///
    /// Individual malformed logs are skipped and logged rather than
    /// failing the whole query.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChainQuery`] when the RPC is unreachable or times out.
    async fn fetch_swap_logs(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawSwapLog>, SyncError>;

    /// Submits one batch-credit transaction for all `(user, jxp)` pairs
    /// and returns its transaction hash without waiting for inclusion.
    ///
    /// The points contract applies the batch atomically: all credits
    /// land or none do.
    ///
    /// # Errors
    ///
    /// [`SyncError::SettlementTx`] when submission is rejected.
    async fn submit_batch_credit(&self, credits: &[(String, u64)]) -> Result<String, SyncError>;

    /// Polls until the transaction is confirmed or the configured
    /// confirmation timeout elapses.
    ///
    /// # Errors
    ///
    /// [`SyncError::SettlementTx`] when the transaction reverted,
    /// [`SyncError::SettlementTimeout`] when the outcome is still
    /// unknown at the deadline.
    async fn await_confirmation(&self, tx_hash: &str) -> Result<(), SyncError>;

    /// Credits a single address directly, outside the batch flow, and
    /// waits for confirmation. Used by the admin surface only.
    ///
    /// # Errors
    ///
    /// [`SyncError::SettlementTx`] or [`SyncError::SettlementTimeout`]
    /// as for batch settlement.
    async fn credit_address(&self, user: &str, amount: u64) -> Result<String, SyncError>;
}
