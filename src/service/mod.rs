//! Service layer: the sync pipeline stages and their orchestrator.
//!
//! Each stage is independently retriable and safely re-runnable; the
//! orchestrator executes them strictly in sequence and records the
//! outcome in [`crate::domain::SyncReport`].

pub mod calculator;
pub mod fetcher;
pub mod orchestrator;
pub mod settler;

pub use calculator::{CalcAborted, CalcOutcome, RewardCalculator};
pub use fetcher::{EventFetcher, FetchOutcome};
pub use orchestrator::SyncOrchestrator;
pub use settler::BatchSettler;
