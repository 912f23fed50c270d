//! Sync orchestrator: Fetch → Calculate → Settle with run statistics.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{StageError, SyncReport, SyncStage};
use crate::error::SyncError;
use crate::persistence::SyncStore;

use super::calculator::RewardCalculator;
use super::fetcher::{EventFetcher, FetchOutcome};
use super::settler::BatchSettler;

/// Runs the three pipeline stages strictly in sequence and records the
/// outcome in [`SystemStats`](crate::domain::SystemStats).
///
/// Whole runs are serialized behind an async mutex: overlapping triggers
/// queue rather than interleave, and a queued run over unchanged durable
/// state is a no-op. A failure in an earlier stage aborts the later
/// stages for that run but is reported, not fatal — the next invocation
/// retries from durable state.
#[derive(Debug)]
pub struct SyncOrchestrator {
    fetcher: EventFetcher,
    calculator: RewardCalculator,
    settler: BatchSettler,
    store: Arc<dyn SyncStore>,
    sync_interval: Duration,
    run_guard: Mutex<()>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the three stages.
    #[must_use]
    pub fn new(
        fetcher: EventFetcher,
        calculator: RewardCalculator,
        settler: BatchSettler,
        store: Arc<dyn SyncStore>,
        sync_interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            calculator,
            settler,
            store,
            sync_interval,
            run_guard: Mutex::new(()),
        }
    }

    /// Runs one full sync cycle. Never fails as a whole: stage failures
    /// are recorded in the report's `errors` and stats are updated with
    /// whatever counts were actually achieved.
    pub async fn run_full_sync(&self) -> SyncReport {
        let _run = self.run_guard.lock().await;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, "full sync run started");

        let mut errors = Vec::new();
        let mut fetched = 0u64;
        let mut processed = 0u64;
        let mut total_jxp_awarded = 0u64;
        let mut users_updated = 0u64;
        let mut settlement = None;

        let mut aborted = false;
        match self.fetcher.fetch_new_events().await {
            Ok(outcome) => fetched = outcome.new_events,
            Err(err) => {
                tracing::warn!(kind = err.kind(), %err, "fetch stage failed");
                errors.push(StageError::from_error(SyncStage::Fetch, &err));
                aborted = true;
            }
        }

        if !aborted {
            match self.calculator.process_unprocessed_events().await {
                Ok(outcome) => {
                    processed = outcome.processed;
                    total_jxp_awarded = outcome.total_jxp;
                    users_updated = outcome.user_updates.len() as u64;
                }
                Err(failure) => {
                    // The pass died partway; whatever it committed is
                    // durable and must be counted.
                    processed = failure.committed.processed;
                    total_jxp_awarded = failure.committed.total_jxp;
                    users_updated = failure.committed.user_updates.len() as u64;
                    let err = failure.error;
                    tracing::warn!(kind = err.kind(), %err, "calculate stage failed");
                    errors.push(StageError::from_error(SyncStage::Calculate, &err));
                    aborted = true;
                }
            }
        }

        if !aborted {
            match self.settler.settle_pending_balances().await {
                Ok(outcome) => settlement = Some(outcome),
                Err(err) => {
                    tracing::warn!(kind = err.kind(), %err, "settle stage failed");
                    errors.push(StageError::from_error(SyncStage::Settle, &err));
                }
            }
        }

        // Stats are updated on success and partial failure alike.
        let finished_at = Utc::now();
        let next_sync_at = finished_at
            + chrono::Duration::from_std(self.sync_interval)
                .unwrap_or_else(|_| chrono::Duration::seconds(300));
        if let Err(err) = self
            .store
            .record_run(processed, total_jxp_awarded, finished_at, next_sync_at)
            .await
        {
            tracing::warn!(kind = err.kind(), %err, "failed to record run stats");
            errors.push(StageError::from_error(SyncStage::Record, &err));
        }

        let report = SyncReport {
            run_id,
            started_at,
            finished_at,
            fetched,
            processed,
            total_jxp_awarded,
            users_updated,
            settlement,
            errors,
        };
        tracing::info!(
            %run_id,
            fetched = report.fetched,
            processed = report.processed,
            total_jxp = report.total_jxp_awarded,
            success = report.success(),
            "full sync run finished"
        );
        report
    }

    /// Runs the fetch stage only (the `/sync/fetch-events` trigger).
    ///
    /// Takes the same run guard as a full sync, so a fetch never writes
    /// into a block range a concurrent full run is working through.
    ///
    /// # Errors
    ///
    /// Propagates the fetch stage failure.
    pub async fn run_fetch_only(&self) -> Result<FetchOutcome, SyncError> {
        let _run = self.run_guard.lock().await;
        self.fetcher.fetch_new_events().await
    }

    /// Runs the settle stage only (the `/admin/manual-settle` trigger).
    ///
    /// Relies on the settler's own single-flight lock rather than the
    /// run guard, so a manual settle racing a scheduled run is rejected
    /// with [`SyncError::SettlementInFlight`] instead of queued.
    ///
    /// # Errors
    ///
    /// Propagates the settle stage failure.
    pub async fn run_settle_only(&self) -> Result<crate::domain::SettlementOutcome, SyncError> {
        self.settler.settle_pending_balances().await
    }
}
