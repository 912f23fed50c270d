//! PostgreSQL implementation of the sync store.
//!
//! Schema lives in `migrations/`. The `(tx_hash, log_index)` primary key
//! on `swap_events` provides the idempotent-insert guarantee; the
//! processed compare-and-set plus ledger increment run inside one
//! transaction so an event is never half-committed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::U256;
use sqlx::PgPool;

use crate::domain::{EventId, PendingLedgerEntry, SwapEvent, SystemStats};
use crate::error::SyncError;

use super::store::SyncStore;

/// Key of the singleton `system_stats` row.
const STATS_KEY: &str = "global";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

type EventRow = (
    String,
    i64,
    String,
    i64,
    DateTime<Utc>,
    String,
    String,
    String,
    String,
    String,
    Option<i64>,
    bool,
    Option<DateTime<Utc>>,
);

impl PostgresStore {
    /// Creates a store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] when a migration fails.
    pub async fn migrate(&self) -> Result<(), SyncError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SyncError::Persistence(e.to_string()))
    }

    fn event_from_row(row: EventRow) -> Result<SwapEvent, SyncError> {
        let (
            tx_hash,
            log_index,
            user,
            block_number,
            occurred_at,
            token_in,
            token_out,
            amount_in,
            amount_out,
            volume,
            calculated_jxp,
            processed,
            processed_at,
        ) = row;
        Ok(SwapEvent {
            id: EventId::new(tx_hash, to_u64(log_index)?),
            user,
            block_number: to_u64(block_number)?,
            timestamp: occurred_at,
            token_in,
            token_out,
            amount_in: parse_u256(&amount_in)?,
            amount_out: parse_u256(&amount_out)?,
            volume: parse_u256(&volume)?,
            calculated_jxp: calculated_jxp.map(to_u64).transpose()?,
            processed,
            processed_at,
        })
    }
}

#[async_trait]
impl SyncStore for PostgresStore {
    async fn insert_event_if_absent(&self, event: &SwapEvent) -> Result<bool, SyncError> {
        let result = sqlx::query(
            "INSERT INTO swap_events \
               (tx_hash, log_index, user_address, block_number, occurred_at, \
                token_in, token_out, amount_in, amount_out, volume, processed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE) \
             ON CONFLICT (tx_hash, log_index) DO NOTHING",
        )
        .bind(&event.id.tx_hash)
        .bind(to_i64(event.id.log_index)?)
        .bind(&event.user)
        .bind(to_i64(event.block_number)?)
        .bind(event.timestamp)
        .bind(&event.token_in)
        .bind(&event.token_out)
        .bind(event.amount_in.to_string())
        .bind(event.amount_out.to_string())
        .bind(event.volume.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn event(&self, id: &EventId) -> Result<Option<SwapEvent>, SyncError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT tx_hash, log_index, user_address, block_number, occurred_at, \
                    token_in, token_out, amount_in, amount_out, volume, \
                    calculated_jxp, processed, processed_at \
             FROM swap_events WHERE tx_hash = $1 AND log_index = $2",
        )
        .bind(&id.tx_hash)
        .bind(to_i64(id.log_index)?)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::event_from_row).transpose()
    }

    async fn unprocessed_events(&self) -> Result<Vec<SwapEvent>, SyncError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT tx_hash, log_index, user_address, block_number, occurred_at, \
                    token_in, token_out, amount_in, amount_out, volume, \
                    calculated_jxp, processed, processed_at \
             FROM swap_events WHERE processed = FALSE \
             ORDER BY occurred_at ASC, tx_hash ASC, log_index ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::event_from_row).collect()
    }

    async fn commit_event_award(
        &self,
        id: &EventId,
        user: &str,
        jxp: u64,
        processed_at: DateTime<Utc>,
    ) -> Result<bool, SyncError> {
        let mut tx = self.pool.begin().await?;

        // The CAS on `processed` is the sole authorization to touch the
        // ledger: losing it means another run already committed this event.
        let updated = sqlx::query(
            "UPDATE swap_events \
             SET processed = TRUE, calculated_jxp = $3, processed_at = $4 \
             WHERE tx_hash = $1 AND log_index = $2 AND processed = FALSE",
        )
        .bind(&id.tx_hash)
        .bind(to_i64(id.log_index)?)
        .bind(to_i64(jxp)?)
        .bind(processed_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO jxp_updates (user_address, pending_jxp, last_updated) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_address) DO UPDATE \
             SET pending_jxp = jxp_updates.pending_jxp + EXCLUDED.pending_jxp, \
                 last_updated = EXCLUDED.last_updated",
        )
        .bind(user)
        .bind(to_i64(jxp)?)
        .bind(processed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn pending_entries(&self) -> Result<Vec<PendingLedgerEntry>, SyncError> {
        let rows = sqlx::query_as::<_, (String, i64, DateTime<Utc>)>(
            "SELECT user_address, pending_jxp, last_updated \
             FROM jxp_updates WHERE pending_jxp > 0 ORDER BY user_address ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(user, pending_jxp, last_updated)| {
                Ok(PendingLedgerEntry {
                    user,
                    pending_jxp: to_u64(pending_jxp)?,
                    last_updated,
                })
            })
            .collect()
    }

    async fn subtract_settled(
        &self,
        credits: &[(String, u64)],
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        // One transaction for the whole batch: a failure partway leaves
        // every balance as it was.
        let mut tx = self.pool.begin().await?;
        for (user, amount) in credits {
            sqlx::query(
                "UPDATE jxp_updates \
                 SET pending_jxp = GREATEST(pending_jxp - $2, 0), last_updated = $3 \
                 WHERE user_address = $1",
            )
            .bind(user)
            .bind(to_i64(*amount)?)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn system_stats(&self) -> Result<SystemStats, SyncError> {
        let row = sqlx::query_as::<
            _,
            (
                Option<DateTime<Utc>>,
                Option<DateTime<Utc>>,
                i64,
                i64,
                Option<i64>,
            ),
        >(
            "SELECT last_sync_at, next_sync_at, total_processed_swaps, \
                    total_jxp_awarded, last_synced_block \
             FROM system_stats WHERE id = $1",
        )
        .bind(STATS_KEY)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(SystemStats::default()),
            Some((last_sync_at, next_sync_at, swaps, jxp, cursor)) => Ok(SystemStats {
                last_sync_at,
                next_sync_at,
                total_processed_swaps: to_u64(swaps)?,
                total_jxp_awarded: to_u64(jxp)?,
                last_synced_block: cursor.map(to_u64).transpose()?,
            }),
        }
    }

    async fn record_run(
        &self,
        processed_delta: u64,
        jxp_delta: u64,
        last_sync_at: DateTime<Utc>,
        next_sync_at: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        sqlx::query(
            "INSERT INTO system_stats \
               (id, last_sync_at, next_sync_at, total_processed_swaps, total_jxp_awarded) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE \
             SET last_sync_at = EXCLUDED.last_sync_at, \
                 next_sync_at = EXCLUDED.next_sync_at, \
                 total_processed_swaps = system_stats.total_processed_swaps \
                     + EXCLUDED.total_processed_swaps, \
                 total_jxp_awarded = system_stats.total_jxp_awarded \
                     + EXCLUDED.total_jxp_awarded",
        )
        .bind(STATS_KEY)
        .bind(last_sync_at)
        .bind(next_sync_at)
        .bind(to_i64(processed_delta)?)
        .bind(to_i64(jxp_delta)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn last_synced_block(&self) -> Result<Option<u64>, SyncError> {
        let row = sqlx::query_as::<_, (Option<i64>,)>(
            "SELECT last_synced_block FROM system_stats WHERE id = $1",
        )
        .bind(STATS_KEY)
        .fetch_optional(&self.pool)
        .await?;

        row.and_then(|(cursor,)| cursor).map(to_u64).transpose()
    }

    async fn advance_cursor(&self, block: u64) -> Result<(), SyncError> {
        sqlx::query(
            "INSERT INTO system_stats (id, last_synced_block) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE \
             SET last_synced_block = GREATEST( \
                 COALESCE(system_stats.last_synced_block, 0), EXCLUDED.last_synced_block)",
        )
        .bind(STATS_KEY)
        .bind(to_i64(block)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_u256(raw: &str) -> Result<U256, SyncError> {
    U256::from_dec_str(raw)
        .map_err(|e| SyncError::Persistence(format!("stored amount not decimal: {e}")))
}

fn to_i64(value: u64) -> Result<i64, SyncError> {
    i64::try_from(value).map_err(|_| SyncError::Persistence(format!("value {value} exceeds i64")))
}

fn to_u64(value: i64) -> Result<u64, SyncError> {
    u64::try_from(value).map_err(|_| SyncError::Persistence(format!("negative stored value {value}")))
}
