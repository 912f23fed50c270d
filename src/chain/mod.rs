//! Chain-facing interface: log queries, batch credits, confirmation.
//!
//! The blockchain is an external collaborator. [`ChainClient`] is the
//! seam the sync engine depends on; [`EthersChainClient`] is the
//! production implementation backed by an ethers `Provider<Http>` and a
//! local settlement signer.

pub mod client;
pub mod ethers_client;

#[cfg(test)]
pub mod mock;

pub use client::{ChainClient, RawSwapLog};
pub use ethers_client::EthersChainClient;
