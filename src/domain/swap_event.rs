//! Swap event identity and record types.

use chrono::{DateTime, Utc};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Unique identity of an on-chain swap occurrence.
///
/// A transaction may emit several swap logs, so the log index is part of
/// the key. Exactly one [`SwapEvent`] may exist per `EventId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Hex-encoded transaction hash (`0x`-prefixed).
    pub tx_hash: String,
    /// Index of the log within the transaction receipt.
    pub log_index: u64,
}

impl EventId {
    /// Creates a new event identity.
    #[must_use]
    pub fn new(tx_hash: impl Into<String>, log_index: u64) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            log_index,
        }
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.log_index)
    }
}

/// One ingested on-chain swap occurrence.
///
/// Created by the event fetcher in `processed = false` state, mutated
/// exactly once by the reward calculator (which sets `processed`,
/// `calculated_jxp`, and `processed_at`), and never deleted.
///
/// Amounts are arbitrary-precision integers serialized as decimal strings
/// to avoid floating-point loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    /// Unique identity `(tx_hash, log_index)`.
    #[serde(flatten)]
    pub id: EventId,
    /// Address of the user that performed the swap.
    pub user: String,
    /// Block the swap was included in.
    pub block_number: u64,
    /// Block timestamp of the swap.
    pub timestamp: DateTime<Utc>,
    /// Address of the token sold into the pool.
    pub token_in: String,
    /// Address of the token bought from the pool.
    pub token_out: String,
    /// Raw input amount in the token's smallest unit.
    #[serde(with = "u256_dec")]
    pub amount_in: U256,
    /// Raw output amount in the token's smallest unit.
    #[serde(with = "u256_dec")]
    pub amount_out: U256,
    /// Swap volume expressed in raw reference-token units.
    #[serde(with = "u256_dec")]
    pub volume: U256,
    /// JXP awarded for this event; set once by the calculator.
    pub calculated_jxp: Option<u64>,
    /// Whether the reward for this event has been committed to the ledger.
    pub processed: bool,
    /// When the event transitioned to processed.
    pub processed_at: Option<DateTime<Utc>>,
}

/// Serde adapter rendering [`U256`] as a decimal string.
///
/// The default `U256` serde representation is hexadecimal; the persisted
/// and wire formats both use decimal strings.
pub mod u256_dec {
    use ethers::types::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Serializes a `U256` as a decimal string.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserializes a `U256` from a decimal string.
    ///
    /// # Errors
    ///
    /// Fails on non-decimal input.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(D::Error::custom)
    }
}
