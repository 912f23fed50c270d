//! # jxp-sync
//!
//! Event-to-reward synchronization engine for JXP loyalty points.
//!
//! Watches a DEX's swap activity on-chain, converts each swap into a
//! deterministic JXP award in a durable pending ledger, and periodically
//! settles aggregated balances back to the points contract in one batch
//! transaction. Ingestion is exactly-once per `(txHash, logIndex)`,
//! accrual is idempotent, and settlement survives partial failure
//! without double-crediting or losing accrued points.
//!
//! ## Architecture
//!
//! ```text
//! Triggers (HTTP: cron scheduler, admin)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── SyncOrchestrator (service/)
//!     │     ├── EventFetcher
//!     │     ├── RewardCalculator
//!     │     └── BatchSettler
//!     │
//!     ├── ChainClient (chain/)
//!     │
//!     └── SyncStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
