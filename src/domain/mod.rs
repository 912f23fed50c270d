//! Domain layer: core sync-engine types.
//!
//! This module contains the durable data model (swap events, the pending
//! ledger, system stats), the pluggable reward rule, and the report types
//! produced by a sync run.

pub mod ledger;
pub mod report;
pub mod reward;
pub mod stats;
pub mod swap_event;

pub use ledger::PendingLedgerEntry;
pub use report::{SettlementOutcome, StageError, SyncReport, SyncStage};
pub use reward::{RewardRule, VolumeReward};
pub use stats::SystemStats;
pub use swap_event::{EventId, SwapEvent};
