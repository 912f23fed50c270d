//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::chain::ChainClient;
use crate::config::SyncConfig;
use crate::persistence::SyncStore;
use crate::service::SyncOrchestrator;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Orchestrator driving the sync pipeline.
    pub orchestrator: Arc<SyncOrchestrator>,
    /// Chain client, used directly for admin credits.
    pub chain: Arc<dyn ChainClient>,
    /// Event and ledger store, used directly for stats reads.
    pub store: Arc<dyn SyncStore>,
    /// Service configuration (shared secrets, intervals).
    pub config: Arc<SyncConfig>,
}
