//! Persistence layer: durable storage for events, ledger, and stats.
//!
//! [`SyncStore`] is the single source of truth. Its primitives are
//! deliberately narrow: conditional insert on event identity, a
//! compare-and-set processed transition that is the sole authorization
//! to increment the ledger, and an all-or-nothing exact-amount
//! settlement subtraction. [`PostgresStore`] is the production
//! implementation; [`MemoryStore`] serves local development and tests.

#[cfg(test)]
pub mod faulty;
pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::SyncStore;
