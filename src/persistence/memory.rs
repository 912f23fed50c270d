//! In-memory implementation of the sync store.
//!
//! Backs local development without a database and every unit test. The
//! semantics mirror [`super::PostgresStore`] exactly: conditional insert
//! on event identity, CAS-guarded ledger increments, all-or-nothing
//! clamped-at-zero settlement subtraction, and a monotone cursor.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{EventId, PendingLedgerEntry, SwapEvent, SystemStats};
use crate::error::SyncError;

use super::store::SyncStore;

#[derive(Debug, Default)]
struct Inner {
    events: HashMap<EventId, SwapEvent>,
    ledger: HashMap<String, PendingLedgerEntry>,
    stats: SystemStats,
}

/// In-memory store guarded by a single async mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of `calculated_jxp` over processed events, for invariant
    /// checks against the ledger.
    pub async fn total_awarded(&self) -> u64 {
        let inner = self.inner.lock().await;
        inner
            .events
            .values()
            .filter(|e| e.processed)
            .filter_map(|e| e.calculated_jxp)
            .sum()
    }

    /// Current pending balance for a user (zero when absent).
    pub async fn pending_of(&self, user: &str) -> u64 {
        let inner = self.inner.lock().await;
        inner.ledger.get(user).map_or(0, |e| e.pending_jxp)
    }

    /// Trait-object handle to a shared store, for wiring into services.
    #[must_use]
    pub fn shared(store: &Arc<Self>) -> Arc<dyn SyncStore> {
        let store = Arc::clone(store);
        store
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn insert_event_if_absent(&self, event: &SwapEvent) -> Result<bool, SyncError> {
        let mut inner = self.inner.lock().await;
        if inner.events.contains_key(&event.id) {
            return Ok(false);
        }
        inner.events.insert(event.id.clone(), event.clone());
        Ok(true)
    }

    async fn event(&self, id: &EventId) -> Result<Option<SwapEvent>, SyncError> {
        let inner = self.inner.lock().await;
        Ok(inner.events.get(id).cloned())
    }

    async fn unprocessed_events(&self) -> Result<Vec<SwapEvent>, SyncError> {
        let inner = self.inner.lock().await;
        let mut events: Vec<SwapEvent> = inner
            .events
            .values()
            .filter(|e| !e.processed)
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.id.tx_hash.cmp(&b.id.tx_hash))
                .then_with(|| a.id.log_index.cmp(&b.id.log_index))
        });
        Ok(events)
    }

    async fn commit_event_award(
        &self,
        id: &EventId,
        user: &str,
        jxp: u64,
        processed_at: DateTime<Utc>,
    ) -> Result<bool, SyncError> {
        let mut inner = self.inner.lock().await;
        match inner.events.get_mut(id) {
            None => Err(SyncError::Persistence(format!("unknown event {id}"))),
            Some(event) if event.processed => Ok(false),
            Some(event) => {
                event.processed = true;
                event.calculated_jxp = Some(jxp);
                event.processed_at = Some(processed_at);

                let entry = inner
                    .ledger
                    .entry(user.to_string())
                    .or_insert_with(|| PendingLedgerEntry {
                        user: user.to_string(),
                        pending_jxp: 0,
                        last_updated: processed_at,
                    });
                entry.pending_jxp = entry.pending_jxp.saturating_add(jxp);
                entry.last_updated = processed_at;
                Ok(true)
            }
        }
    }

    async fn pending_entries(&self) -> Result<Vec<PendingLedgerEntry>, SyncError> {
        let inner = self.inner.lock().await;
        let mut entries: Vec<PendingLedgerEntry> = inner
            .ledger
            .values()
            .filter(|e| e.pending_jxp > 0)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.user.cmp(&b.user));
        Ok(entries)
    }

    async fn subtract_settled(
        &self,
        credits: &[(String, u64)],
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        // One lock span covers the whole batch, so no subset of users is
        // ever subtracted without the rest.
        let mut inner = self.inner.lock().await;
        for (user, amount) in credits {
            if let Some(entry) = inner.ledger.get_mut(user) {
                entry.pending_jxp = entry.pending_jxp.saturating_sub(*amount);
                entry.last_updated = now;
            }
        }
        Ok(())
    }

    async fn system_stats(&self) -> Result<SystemStats, SyncError> {
        let inner = self.inner.lock().await;
        Ok(inner.stats.clone())
    }

    async fn record_run(
        &self,
        processed_delta: u64,
        jxp_delta: u64,
        last_sync_at: DateTime<Utc>,
        next_sync_at: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let mut inner = self.inner.lock().await;
        inner.stats.last_sync_at = Some(last_sync_at);
        inner.stats.next_sync_at = Some(next_sync_at);
        inner.stats.total_processed_swaps = inner
            .stats
            .total_processed_swaps
            .saturating_add(processed_delta);
        inner.stats.total_jxp_awarded = inner.stats.total_jxp_awarded.saturating_add(jxp_delta);
        Ok(())
    }

    async fn last_synced_block(&self) -> Result<Option<u64>, SyncError> {
        let inner = self.inner.lock().await;
        Ok(inner.stats.last_synced_block)
    }

    async fn advance_cursor(&self, block: u64) -> Result<(), SyncError> {
        let mut inner = self.inner.lock().await;
        let current = inner.stats.last_synced_block.unwrap_or(0);
        inner.stats.last_synced_block = Some(current.max(block));
        Ok(())
    }
}
