//! Event fetcher: chain logs → event store.

use std::sync::Arc;

use crate::chain::{ChainClient, RawSwapLog};
use crate::domain::{EventId, SwapEvent};
use crate::error::SyncError;
use crate::persistence::SyncStore;

/// Result of one fetch pass.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Count of genuinely new events stored (zero is a valid outcome).
    pub new_events: u64,
    /// Inclusive block window that was queried, when one existed.
    pub window: Option<(u64, u64)>,
}

/// Queries the chain for swap events since the durable cursor and writes
/// new ones into the event store.
///
/// Delivery from the chain is at-least-once: after a partial failure the
/// same window is re-queried on the next run, and the conditional insert
/// on `(tx_hash, log_index)` turns that into effectively exactly-once
/// storage.
#[derive(Debug, Clone)]
pub struct EventFetcher {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn SyncStore>,
    deployment_block: u64,
}

impl EventFetcher {
    /// Creates a fetcher over the given chain and store.
    #[must_use]
    pub fn new(chain: Arc<dyn ChainClient>, store: Arc<dyn SyncStore>, deployment_block: u64) -> Self {
        Self {
            chain,
            store,
            deployment_block,
        }
    }

    /// Fetches and stores all swap events between the cursor and the
    /// chain head.
    ///
    /// The cursor advances only after the whole window has been
    /// ingested, so an RPC or store failure leaves it untouched and the
    /// next run retries the same window.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChainQuery`] when the RPC fails or times out,
    /// [`SyncError::Persistence`] when the store does. No cursor
    /// movement happens in either case.
    pub async fn fetch_new_events(&self) -> Result<FetchOutcome, SyncError> {
        let head = self.chain.latest_block().await?;
        let cursor = self.store.last_synced_block().await?;
        let from = cursor
            .map_or(self.deployment_block, |c| c.saturating_add(1))
            .max(self.deployment_block);

        if from > head {
            tracing::debug!(from, head, "no new blocks to fetch");
            return Ok(FetchOutcome {
                new_events: 0,
                window: None,
            });
        }

        let logs = self.chain.fetch_swap_logs(from, head).await?;
        let mut new_events = 0u64;
        for log in logs {
            let event = normalize(log);
            if self.store.insert_event_if_absent(&event).await? {
                new_events += 1;
            }
        }

        self.store.advance_cursor(head).await?;
        tracing::info!(from, to = head, new_events, "fetch window ingested");

        Ok(FetchOutcome {
            new_events,
            window: Some((from, head)),
        })
    }
}

/// Normalizes a decoded chain log into an unprocessed [`SwapEvent`].
///
/// Volume is the raw reference-token amount of the input side; decimal
/// scaling is applied by the reward rule, keeping all stored amounts
/// integer-exact.
fn normalize(log: RawSwapLog) -> SwapEvent {
    SwapEvent {
        id: EventId::new(log.tx_hash, log.log_index),
        user: log.user,
        block_number: log.block_number,
        timestamp: log.timestamp,
        token_in: log.token_in,
        token_out: log.token_out,
        amount_in: log.amount_in,
        amount_out: log.amount_out,
        volume: log.amount_in,
        calculated_jxp: None,
        processed: false,
        processed_at: None,
    }
}
