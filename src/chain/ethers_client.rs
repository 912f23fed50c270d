//! Ethers-backed [`ChainClient`] implementation.
//!
//! Uses a `Provider<Http>` for log queries and a `SignerMiddleware` with
//! a local settlement key for credit transactions. Swap logs follow the
//! Uniswap-V2 pair `Swap` event shape; token direction is resolved
//! against the pair's `token0`/`token1`, cached per pool after the first
//! lookup.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::contract::{EthEvent, parse_log};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Filter, Log, TransactionReceipt, TxHash, U64, U256};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::SyncConfig;
use crate::error::SyncError;

use super::client::{ChainClient, RawSwapLog};

mod bindings {
    //! Contract bindings generated by `abigen`.
    #![allow(
        missing_docs,
        missing_debug_implementations,
        clippy::too_many_arguments,
        clippy::unwrap_used,
        clippy::expect_used
    )]

    use ethers::contract::abigen;

    abigen!(
        JxpPoints,
        r#"[
            function addPoints(address user, uint256 amount) external
            function addPointsBatch(address[] calldata users, uint256[] calldata amounts) external
        ]"#
    );

    abigen!(
        IUniswapV2Pair,
        r#"[
            event Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to)
            function token0() external view returns (address)
            function token1() external view returns (address)
        ]"#
    );
}

use bindings::{IUniswapV2Pair, JxpPoints, SwapFilter};

type SettlementSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Production chain client: HTTP JSON-RPC provider plus settlement signer.
pub struct EthersChainClient {
    provider: Provider<Http>,
    points: JxpPoints<SettlementSigner>,
    pools: Vec<Address>,
    // token0/token1 per pool, resolved lazily on first log.
    token_pairs: Mutex<HashMap<Address, (Address, Address)>>,
    rpc_timeout: Duration,
    confirmation_timeout: Duration,
    confirmation_poll: Duration,
}

impl std::fmt::Debug for EthersChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthersChainClient")
            .field("points", &self.points.address())
            .field("pools", &self.pools)
            .finish_non_exhaustive()
    }
}

impl EthersChainClient {
    /// Builds a client from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when the RPC URL, signer key,
    /// or any contract address fails to parse.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| SyncError::Validation(format!("invalid RPC URL: {e}")))?;

        let wallet = LocalWallet::from_str(&config.settlement_signer_key)
            .map_err(|e| SyncError::Validation(format!("invalid settlement signer key: {e}")))?
            .with_chain_id(config.chain_id);

        let points_address = parse_address(&config.points_contract)?;
        let signer = Arc::new(SignerMiddleware::new(provider.clone(), wallet));
        let points = JxpPoints::new(points_address, signer);

        let pools = config
            .pool_addresses
            .iter()
            .map(|raw| parse_address(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            provider,
            points,
            pools,
            token_pairs: Mutex::new(HashMap::new()),
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
            confirmation_poll: Duration::from_millis(config.confirmation_poll_ms),
        })
    }

    /// Resolves (and caches) the token pair of a pool contract.
    async fn token_pair(&self, pool: Address) -> Result<(Address, Address), SyncError> {
        {
            let cache = self.token_pairs.lock().await;
            if let Some(pair) = cache.get(&pool) {
                return Ok(*pair);
            }
        }

        let contract = IUniswapV2Pair::new(pool, Arc::new(self.provider.clone()));
        let token0 = timeout(self.rpc_timeout, contract.token_0().call())
            .await
            .map_err(|_| SyncError::ChainQuery(format!("token0 query timed out for {pool:?}")))?
            .map_err(|e| SyncError::ChainQuery(format!("token0 query failed for {pool:?}: {e}")))?;
        let token1 = timeout(self.rpc_timeout, contract.token_1().call())
            .await
            .map_err(|_| SyncError::ChainQuery(format!("token1 query timed out for {pool:?}")))?
            .map_err(|e| SyncError::ChainQuery(format!("token1 query failed for {pool:?}: {e}")))?;

        let mut cache = self.token_pairs.lock().await;
        cache.insert(pool, (token0, token1));
        Ok((token0, token1))
    }

    /// Fetches (and caches within one call) block timestamps for logs.
    async fn block_timestamp(
        &self,
        cache: &mut HashMap<u64, DateTime<Utc>>,
        block_number: u64,
    ) -> Result<DateTime<Utc>, SyncError> {
        if let Some(ts) = cache.get(&block_number) {
            return Ok(*ts);
        }
        let block = timeout(self.rpc_timeout, self.provider.get_block(block_number))
            .await
            .map_err(|_| SyncError::ChainQuery(format!("block {block_number} query timed out")))?
            .map_err(|e| SyncError::ChainQuery(format!("block {block_number} query failed: {e}")))?
            .ok_or_else(|| SyncError::ChainQuery(format!("block {block_number} not found")))?;
        let secs = i64::try_from(block.timestamp.as_u64())
            .map_err(|_| SyncError::Decode(format!("block {block_number} timestamp overflow")))?;
        let ts = DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| SyncError::Decode(format!("block {block_number} timestamp invalid")))?;
        cache.insert(block_number, ts);
        Ok(ts)
    }

    /// Decodes one raw log into a [`RawSwapLog`], resolving direction
    /// from the pool's token pair.
    async fn decode_swap(
        &self,
        log: Log,
        timestamps: &mut HashMap<u64, DateTime<Utc>>,
    ) -> Result<RawSwapLog, SyncError> {
        let tx_hash = log
            .transaction_hash
            .ok_or_else(|| SyncError::Decode("log without transaction hash".to_string()))?;
        let log_index = log
            .log_index
            .ok_or_else(|| SyncError::Decode("log without log index".to_string()))?
            .as_u64();
        let block_number = log
            .block_number
            .ok_or_else(|| SyncError::Decode("log without block number".to_string()))?
            .as_u64();
        let pool = log.address;

        let swap: SwapFilter = parse_log(log)
            .map_err(|e| SyncError::Decode(format!("malformed Swap log in {tx_hash:?}: {e}")))?;

        let (token0, token1) = self.token_pair(pool).await?;
        // Direction: a nonzero amount0In means token0 was sold into the
        // pool; otherwise token1 was.
        let (token_in, token_out, amount_in, amount_out) = if swap.amount_0_in > U256::zero() {
            (token0, token1, swap.amount_0_in, swap.amount_1_out)
        } else {
            (token1, token0, swap.amount_1_in, swap.amount_0_out)
        };

        let timestamp = self.block_timestamp(timestamps, block_number).await?;

        Ok(RawSwapLog {
            tx_hash: format!("{tx_hash:?}"),
            log_index,
            block_number,
            timestamp,
            user: format!("{:?}", swap.to),
            token_in: format!("{token_in:?}"),
            token_out: format!("{token_out:?}"),
            amount_in,
            amount_out,
        })
    }
}

#[async_trait]
impl ChainClient for EthersChainClient {
    async fn latest_block(&self) -> Result<u64, SyncError> {
        let head = timeout(self.rpc_timeout, self.provider.get_block_number())
            .await
            .map_err(|_| SyncError::ChainQuery("block number query timed out".to_string()))?
            .map_err(|e| SyncError::ChainQuery(format!("block number query failed: {e}")))?;
        Ok(head.as_u64())
    }

    async fn fetch_swap_logs(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawSwapLog>, SyncError> {
        let filter = Filter::new()
            .address(self.pools.clone())
            .topic0(SwapFilter::signature())
            .from_block(from_block)
            .to_block(to_block);

        let logs = timeout(self.rpc_timeout, self.provider.get_logs(&filter))
            .await
            .map_err(|_| SyncError::ChainQuery("log query timed out".to_string()))?
            .map_err(|e| SyncError::ChainQuery(format!("log query failed: {e}")))?;

        let mut timestamps = HashMap::new();
        let mut swaps = Vec::with_capacity(logs.len());
        for log in logs {
            match self.decode_swap(log, &mut timestamps).await {
                Ok(swap) => swaps.push(swap),
                // Malformed individual logs must not abort the batch.
                Err(SyncError::Decode(reason)) => {
                    tracing::warn!(%reason, "skipping undecodable swap log");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(swaps)
    }

    async fn submit_batch_credit(&self, credits: &[(String, u64)]) -> Result<String, SyncError> {
        let mut users = Vec::with_capacity(credits.len());
        let mut amounts = Vec::with_capacity(credits.len());
        for (user, jxp) in credits {
            users.push(parse_address(user)?);
            amounts.push(U256::from(*jxp));
        }

        let call = self.points.add_points_batch(users, amounts);
        let pending = call
            .send()
            .await
            .map_err(|e| SyncError::SettlementTx(format!("batch credit submission failed: {e}")))?;
        Ok(format!("{:?}", pending.tx_hash()))
    }

    async fn await_confirmation(&self, tx_hash: &str) -> Result<(), SyncError> {
        let hash = TxHash::from_str(tx_hash)
            .map_err(|e| SyncError::Validation(format!("invalid transaction hash: {e}")))?;

        let poll = async {
            loop {
                // The transaction is already submitted, so a transient
                // receipt-query failure must not end the wait: only a
                // revert or the confirmation deadline may.
                match self.provider.get_transaction_receipt(hash).await {
                    Ok(receipt) => match receipt_outcome(receipt.as_ref()) {
                        ReceiptOutcome::Confirmed => return Ok(()),
                        ReceiptOutcome::Reverted => {
                            return Err(SyncError::SettlementTx(format!(
                                "transaction {tx_hash} reverted"
                            )));
                        }
                        ReceiptOutcome::Pending => {}
                    },
                    Err(err) => {
                        tracing::warn!(%tx_hash, error = %err, "receipt query failed, retrying");
                    }
                }
                tokio::time::sleep(self.confirmation_poll).await;
            }
        };

        timeout(self.confirmation_timeout, poll)
            .await
            .map_err(|_| SyncError::SettlementTimeout(tx_hash.to_string()))?
    }

    async fn credit_address(&self, user: &str, amount: u64) -> Result<String, SyncError> {
        let address = parse_address(user)?;
        let call = self.points.add_points(address, U256::from(amount));
        let pending = call
            .send()
            .await
            .map_err(|e| SyncError::SettlementTx(format!("credit submission failed: {e}")))?;
        let tx_hash = format!("{:?}", pending.tx_hash());
        self.await_confirmation(&tx_hash).await?;
        Ok(tx_hash)
    }
}

/// What one receipt poll learned about a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiptOutcome {
    /// Not yet mined; keep polling.
    Pending,
    /// Mined with success status.
    Confirmed,
    /// Mined but reverted.
    Reverted,
}

fn receipt_outcome(receipt: Option<&TransactionReceipt>) -> ReceiptOutcome {
    match receipt {
        None => ReceiptOutcome::Pending,
        Some(receipt) if receipt.status == Some(U64::one()) => ReceiptOutcome::Confirmed,
        Some(_) => ReceiptOutcome::Reverted,
    }
}

/// Parses a hex address, mapping failures to [`SyncError::Validation`].
fn parse_address(raw: &str) -> Result<Address, SyncError> {
    Address::from_str(raw).map_err(|_| SyncError::Validation(format!("invalid address: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_receipt_keeps_polling() {
        assert_eq!(receipt_outcome(None), ReceiptOutcome::Pending);
    }

    #[test]
    fn receipt_status_decides_confirmation() {
        let confirmed = TransactionReceipt {
            status: Some(U64::one()),
            ..TransactionReceipt::default()
        };
        assert_eq!(receipt_outcome(Some(&confirmed)), ReceiptOutcome::Confirmed);

        let reverted = TransactionReceipt {
            status: Some(U64::zero()),
            ..TransactionReceipt::default()
        };
        assert_eq!(receipt_outcome(Some(&reverted)), ReceiptOutcome::Reverted);
    }
}
