//! The `SyncStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EventId, PendingLedgerEntry, SwapEvent, SystemStats};
use crate::error::SyncError;

/// Durable store backing the sync engine.
///
/// All mutations are atomic per document: there is no lost-update window
/// between reading and writing a single event or ledger entry, because
/// each primitive below performs its read-check-write inside the store.
#[async_trait]
pub trait SyncStore: Send + Sync + std::fmt::Debug {
    /// Inserts a swap event unless one with the same `(tx_hash,
    /// log_index)` already exists. Returns `true` when the event was
    /// genuinely new. Re-inserting is a no-op, not an error, so an
    /// overlapping fetch window can be safely re-run.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn insert_event_if_absent(&self, event: &SwapEvent) -> Result<bool, SyncError>;

    /// Returns the stored event for the given identity, if any.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn event(&self, id: &EventId) -> Result<Option<SwapEvent>, SyncError>;

    /// All events with `processed = false`, ordered by timestamp, then
    /// transaction hash, then log index — a deterministic processing
    /// order.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn unprocessed_events(&self) -> Result<Vec<SwapEvent>, SyncError>;

    /// Atomically transitions an event from unprocessed to processed
    /// and increments the user's pending balance by `jxp`, as one unit.
    ///
    /// The compare-and-set on the `processed` flag is the at-most-once
    /// guard: the ledger is incremented only when this call wins the
    /// transition. Returns `false` (with no side effects) when the event
    /// was already processed.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure; the event and the
    /// ledger are then both unchanged.
    async fn commit_event_award(
        &self,
        id: &EventId,
        user: &str,
        jxp: u64,
        processed_at: DateTime<Utc>,
    ) -> Result<bool, SyncError>;

    /// All ledger entries with a positive pending balance.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn pending_entries(&self) -> Result<Vec<PendingLedgerEntry>, SyncError>;

    /// Subtracts exactly the submitted amount from each user's pending
    /// balance, clamping at zero, as one atomic batch. Called only after
    /// a settlement transaction is confirmed; accrual that arrived after
    /// the settlement snapshot survives because the submitted amounts,
    /// not the current balances, are subtracted.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure; no user in the batch
    /// was subtracted in that case.
    async fn subtract_settled(
        &self,
        credits: &[(String, u64)],
        now: DateTime<Utc>,
    ) -> Result<(), SyncError>;

    /// Reads the singleton stats record (defaults when absent).
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn system_stats(&self) -> Result<SystemStats, SyncError>;

    /// Records the end of an orchestrator run: adds the run's processed
    /// and awarded deltas to the cumulative totals and stamps the
    /// last/next sync times.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn record_run(
        &self,
        processed_delta: u64,
        jxp_delta: u64,
        last_sync_at: DateTime<Utc>,
        next_sync_at: DateTime<Utc>,
    ) -> Result<(), SyncError>;

    /// Highest block whose logs have been fully ingested, if any.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn last_synced_block(&self) -> Result<Option<u64>, SyncError>;

    /// Advances the durable fetch cursor. The cursor is monotone: a
    /// smaller value than the stored one is ignored.
    ///
    /// # Errors
    ///
    /// [`SyncError::Persistence`] on store failure.
    async fn advance_cursor(&self, block: u64) -> Result<(), SyncError>;
}
