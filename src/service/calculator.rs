//! Reward calculator: event store → pending ledger.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::RewardRule;
use crate::error::SyncError;
use crate::persistence::SyncStore;

/// Result of one calculation pass.
#[derive(Debug, Clone, Default)]
pub struct CalcOutcome {
    /// Events transitioned from unprocessed to processed.
    pub processed: u64,
    /// Total JXP awarded this pass.
    pub total_jxp: u64,
    /// Per-user JXP deltas accrued this pass.
    pub user_updates: HashMap<String, u64>,
}

/// A calculation pass that failed partway through.
///
/// Commits are durable one event at a time, so everything counted in
/// `committed` is already in the ledger even though the pass did not
/// finish. Run statistics must account for it.
#[derive(Debug)]
pub struct CalcAborted {
    /// Progress durably committed before the failure.
    pub committed: CalcOutcome,
    /// The store failure that ended the pass.
    pub error: SyncError,
}

/// Scans unprocessed events, computes each award, and commits the
/// processed transition together with the ledger increment.
///
/// The commit is a compare-and-set on the event's `processed` flag, so
/// a restarted or overlapping run can never double-credit: an event that
/// has already won the transition is skipped without side effects.
#[derive(Debug, Clone)]
pub struct RewardCalculator {
    store: Arc<dyn SyncStore>,
    rule: Arc<dyn RewardRule>,
}

impl RewardCalculator {
    /// Creates a calculator over the given store and reward rule.
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>, rule: Arc<dyn RewardRule>) -> Self {
        Self { store, rule }
    }

    /// Processes every unprocessed event in deterministic order
    /// (timestamp, then tx hash, then log index).
    ///
    /// Zero unprocessed events returns zeros without side effects — a
    /// valid terminal state of a sync cycle.
    ///
    /// # Errors
    ///
    /// [`CalcAborted`] on store failure. Already-committed events stay
    /// committed and are counted in the aborted pass's `committed`
    /// outcome; the rest stay unprocessed for the next run.
    pub async fn process_unprocessed_events(&self) -> Result<CalcOutcome, CalcAborted> {
        let events = match self.store.unprocessed_events().await {
            Ok(events) => events,
            Err(error) => {
                return Err(CalcAborted {
                    committed: CalcOutcome::default(),
                    error,
                });
            }
        };
        if events.is_empty() {
            return Ok(CalcOutcome::default());
        }

        let mut outcome = CalcOutcome::default();
        for event in events {
            let jxp = self
                .rule
                .award(event.volume, &event.token_in, &event.token_out);
            let won = match self
                .store
                .commit_event_award(&event.id, &event.user, jxp, Utc::now())
                .await
            {
                Ok(won) => won,
                Err(error) => {
                    // Everything counted so far is already durable.
                    return Err(CalcAborted {
                        committed: outcome,
                        error,
                    });
                }
            };
            if !won {
                // Another run committed this event between our scan and
                // the CAS; its award is already in the ledger.
                continue;
            }
            outcome.processed += 1;
            outcome.total_jxp = outcome.total_jxp.saturating_add(jxp);
            *outcome.user_updates.entry(event.user).or_default() += jxp;
        }

        tracing::info!(
            processed = outcome.processed,
            total_jxp = outcome.total_jxp,
            users = outcome.user_updates.len(),
            "reward calculation pass complete"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::{EventId, SwapEvent, VolumeReward};
    use crate::persistence::MemoryStore;
    use crate::persistence::faulty::FaultyStore;
    use chrono::{Duration, Utc};
    use ethers::types::U256;

    fn event(tx: &str, user: &str, amount: &str, age_secs: i64) -> SwapEvent {
        let amount = U256::from_dec_str(amount).unwrap();
        SwapEvent {
            id: EventId::new(tx, 0),
            user: user.to_string(),
            block_number: 1,
            timestamp: Utc::now() - Duration::seconds(age_secs),
            token_in: "0xa".to_string(),
            token_out: "0xb".to_string(),
            amount_in: amount,
            amount_out: U256::from(1u64),
            volume: amount,
            calculated_jxp: None,
            processed: false,
            processed_at: None,
        }
    }

    fn calculator(store: Arc<MemoryStore>) -> RewardCalculator {
        RewardCalculator::new(store, Arc::new(VolumeReward::new(10, 18)))
    }

    #[tokio::test]
    async fn one_token_swap_awards_ten_jxp() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_event_if_absent(&event("0x1", "0xalice", "1000000000000000000", 0))
            .await
            .unwrap();

        let outcome = calculator(Arc::clone(&store))
            .process_unprocessed_events()
            .await
            .unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.total_jxp, 10);
        assert_eq!(outcome.user_updates.get("0xalice"), Some(&10));
        assert_eq!(store.pending_of("0xalice").await, 10);

        let stored = store.event(&EventId::new("0x1", 0)).await.unwrap().unwrap();
        assert!(stored.processed);
        assert_eq!(stored.calculated_jxp, Some(10));
        assert!(stored.processed_at.is_some());
    }

    #[tokio::test]
    async fn reprocessing_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_event_if_absent(&event("0x1", "0xalice", "1000000000000000000", 0))
            .await
            .unwrap();
        let calc = calculator(Arc::clone(&store));

        let first = calc.process_unprocessed_events().await.unwrap();
        let second = calc.process_unprocessed_events().await.unwrap();

        assert_eq!(first.processed, 1);
        assert_eq!(second.processed, 0);
        assert_eq!(second.total_jxp, 0);
        assert_eq!(store.pending_of("0xalice").await, 10);
        let stored = store.event(&EventId::new("0x1", 0)).await.unwrap().unwrap();
        assert_eq!(stored.calculated_jxp, Some(10));
    }

    #[tokio::test]
    async fn ledger_matches_awards_across_users() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_event_if_absent(&event("0x1", "0xalice", "2000000000000000000", 30))
            .await
            .unwrap();
        store
            .insert_event_if_absent(&event("0x2", "0xbob", "500000000000000000", 20))
            .await
            .unwrap();
        store
            .insert_event_if_absent(&event("0x3", "0xalice", "1000000000000000000", 10))
            .await
            .unwrap();

        let outcome = calculator(Arc::clone(&store))
            .process_unprocessed_events()
            .await
            .unwrap();

        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.total_jxp, 35);
        assert_eq!(store.pending_of("0xalice").await, 30);
        assert_eq!(store.pending_of("0xbob").await, 5);
        // Ledger-consistency invariant: pending sum equals awarded sum
        // while nothing is settled.
        assert_eq!(store.total_awarded().await, 35);
    }

    #[tokio::test]
    async fn mid_pass_failure_keeps_committed_progress() {
        let store = Arc::new(FaultyStore::default());
        store
            .insert_event_if_absent(&event("0x1", "0xalice", "1000000000000000000", 30))
            .await
            .unwrap();
        store
            .insert_event_if_absent(&event("0x2", "0xbob", "1000000000000000000", 10))
            .await
            .unwrap();
        *store.fail_commit_for.lock().await = Some("0xbob".to_string());

        let calc = RewardCalculator::new(
            FaultyStore::shared(&store),
            Arc::new(VolumeReward::new(10, 18)),
        );
        let aborted = calc.process_unprocessed_events().await.unwrap_err();

        // Alice's commit (older timestamp, processed first) is durable
        // and counted; bob's event is untouched for the next run.
        assert_eq!(aborted.committed.processed, 1);
        assert_eq!(aborted.committed.total_jxp, 10);
        assert_eq!(aborted.committed.user_updates.get("0xalice"), Some(&10));
        assert_eq!(aborted.error.kind(), "persistence_failure");
        assert_eq!(store.inner.pending_of("0xalice").await, 10);
        assert_eq!(store.inner.pending_of("0xbob").await, 0);

        // Clearing the fault lets the next pass pick up the remainder
        // without double-crediting alice.
        *store.fail_commit_for.lock().await = None;
        let outcome = calc.process_unprocessed_events().await.unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(store.inner.pending_of("0xalice").await, 10);
        assert_eq!(store.inner.pending_of("0xbob").await, 10);
    }

    #[tokio::test]
    async fn empty_store_returns_zeros() {
        let store = Arc::new(MemoryStore::new());
        let outcome = calculator(store)
            .process_unprocessed_events()
            .await
            .unwrap();
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.total_jxp, 0);
        assert!(outcome.user_updates.is_empty());
    }
}
