//! Scriptable in-memory [`ChainClient`] for tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::SyncError;

use super::client::{ChainClient, RawSwapLog};

/// How the mock resolves confirmation polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmBehavior {
    /// Confirm successfully.
    Confirm,
    /// Report the transaction as reverted.
    Revert,
    /// Report a confirmation timeout.
    Timeout,
}

type SubmitHook = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Scriptable chain double.
///
/// Tests configure the chain head, the logs to serve, failure switches,
/// and the confirmation behavior. `on_submit` is a one-shot future run
/// after a batch is submitted but before confirmation resolves; it lets
/// tests interleave ledger accrual with an in-flight settlement.
#[derive(Default)]
pub struct MockChain {
    /// Chain head served by `latest_block`.
    pub head: AtomicU64,
    /// Logs served by `fetch_swap_logs` (filtered to the block range).
    pub logs: Mutex<Vec<RawSwapLog>>,
    /// When set, `latest_block` and `fetch_swap_logs` fail.
    pub fail_rpc: AtomicBool,
    /// When set, `submit_batch_credit` is rejected.
    pub fail_submit: AtomicBool,
    /// Confirmation behavior; defaults to confirm.
    pub confirm: Mutex<Option<ConfirmBehavior>>,
    /// Batches submitted so far.
    pub submitted_batches: Mutex<Vec<Vec<(String, u64)>>>,
    /// Single credits issued via `credit_address`.
    pub single_credits: Mutex<Vec<(String, u64)>>,
    /// One-shot future run between submission and confirmation.
    pub on_submit: Mutex<Option<SubmitHook>>,
    next_tx: AtomicU64,
}

impl std::fmt::Debug for MockChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChain")
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

impl MockChain {
    /// Creates a mock with the given chain head.
    #[must_use]
    pub fn with_head(head: u64) -> Self {
        let chain = Self::default();
        chain.head.store(head, Ordering::SeqCst);
        chain
    }

    /// Replaces the served logs.
    pub async fn set_logs(&self, logs: Vec<RawSwapLog>) {
        *self.logs.lock().await = logs;
    }

    /// Sets the confirmation behavior for subsequent settlements.
    pub async fn set_confirm(&self, behavior: ConfirmBehavior) {
        *self.confirm.lock().await = Some(behavior);
    }

    /// Trait-object handle to a shared mock, for wiring into services.
    #[must_use]
    pub fn shared(chain: &Arc<Self>) -> Arc<dyn ChainClient> {
        let chain = Arc::clone(chain);
        chain
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn latest_block(&self) -> Result<u64, SyncError> {
        if self.fail_rpc.load(Ordering::SeqCst) {
            return Err(SyncError::ChainQuery("mock rpc unavailable".to_string()));
        }
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn fetch_swap_logs(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawSwapLog>, SyncError> {
        if self.fail_rpc.load(Ordering::SeqCst) {
            return Err(SyncError::ChainQuery("mock rpc unavailable".to_string()));
        }
        let logs = self.logs.lock().await;
        Ok(logs
            .iter()
            .filter(|log| log.block_number >= from_block && log.block_number <= to_block)
            .cloned()
            .collect())
    }

    async fn submit_batch_credit(&self, credits: &[(String, u64)]) -> Result<String, SyncError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(SyncError::SettlementTx("mock submission rejected".to_string()));
        }
        self.submitted_batches.lock().await.push(credits.to_vec());
        if let Some(hook) = self.on_submit.lock().await.take() {
            hook.await;
        }
        let seq = self.next_tx.fetch_add(1, Ordering::SeqCst);
        Ok(format!("0xmock{seq:04x}"))
    }

    async fn await_confirmation(&self, tx_hash: &str) -> Result<(), SyncError> {
        match (*self.confirm.lock().await).unwrap_or(ConfirmBehavior::Confirm) {
            ConfirmBehavior::Confirm => Ok(()),
            ConfirmBehavior::Revert => Err(SyncError::SettlementTx(format!(
                "transaction {tx_hash} reverted"
            ))),
            ConfirmBehavior::Timeout => Err(SyncError::SettlementTimeout(tx_hash.to_string())),
        }
    }

    async fn credit_address(&self, user: &str, amount: u64) -> Result<String, SyncError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(SyncError::SettlementTx("mock submission rejected".to_string()));
        }
        self.single_credits
            .lock()
            .await
            .push((user.to_string(), amount));
        let seq = self.next_tx.fetch_add(1, Ordering::SeqCst);
        Ok(format!("0xmock{seq:04x}"))
    }
}
