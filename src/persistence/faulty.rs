//! Failure-injecting [`SyncStore`] wrapper for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{EventId, PendingLedgerEntry, SwapEvent, SystemStats};
use crate::error::SyncError;

use super::memory::MemoryStore;
use super::store::SyncStore;

/// Delegates to a [`MemoryStore`] but fails specific operations on
/// demand.
///
/// Injected failures happen before any state is touched, matching the
/// contract that a failed store primitive leaves everything as it was.
#[derive(Debug, Default)]
pub struct FaultyStore {
    /// The real store behind the failure switches.
    pub inner: MemoryStore,
    /// When set, `commit_event_award` fails for this user address.
    pub fail_commit_for: Mutex<Option<String>>,
    /// When set, `subtract_settled` fails without touching the ledger.
    pub fail_subtract: AtomicBool,
    /// When set, `record_run` fails.
    pub fail_record: AtomicBool,
}

impl FaultyStore {
    /// Trait-object handle to a shared store, for wiring into services.
    #[must_use]
    pub fn shared(store: &Arc<Self>) -> Arc<dyn SyncStore> {
        let store = Arc::clone(store);
        store
    }
}

#[async_trait]
impl SyncStore for FaultyStore {
    async fn insert_event_if_absent(&self, event: &SwapEvent) -> Result<bool, SyncError> {
        self.inner.insert_event_if_absent(event).await
    }

    async fn event(&self, id: &EventId) -> Result<Option<SwapEvent>, SyncError> {
        self.inner.event(id).await
    }

    async fn unprocessed_events(&self) -> Result<Vec<SwapEvent>, SyncError> {
        self.inner.unprocessed_events().await
    }

    async fn commit_event_award(
        &self,
        id: &EventId,
        user: &str,
        jxp: u64,
        processed_at: DateTime<Utc>,
    ) -> Result<bool, SyncError> {
        if self.fail_commit_for.lock().await.as_deref() == Some(user) {
            return Err(SyncError::Persistence(format!(
                "injected commit failure for {user}"
            )));
        }
        self.inner.commit_event_award(id, user, jxp, processed_at).await
    }

    async fn pending_entries(&self) -> Result<Vec<PendingLedgerEntry>, SyncError> {
        self.inner.pending_entries().await
    }

    async fn subtract_settled(
        &self,
        credits: &[(String, u64)],
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        if self.fail_subtract.load(Ordering::SeqCst) {
            return Err(SyncError::Persistence(
                "injected subtraction failure".to_string(),
            ));
        }
        self.inner.subtract_settled(credits, now).await
    }

    async fn system_stats(&self) -> Result<SystemStats, SyncError> {
        self.inner.system_stats().await
    }

    async fn record_run(
        &self,
        processed_delta: u64,
        jxp_delta: u64,
        last_sync_at: DateTime<Utc>,
        next_sync_at: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        if self.fail_record.load(Ordering::SeqCst) {
            return Err(SyncError::Persistence(
                "injected stats failure".to_string(),
            ));
        }
        self.inner
            .record_run(processed_delta, jxp_delta, last_sync_at, next_sync_at)
            .await
    }

    async fn last_synced_block(&self) -> Result<Option<u64>, SyncError> {
        self.inner.last_synced_block().await
    }

    async fn advance_cursor(&self, block: u64) -> Result<(), SyncError> {
        self.inner.advance_cursor(block).await
    }
}
