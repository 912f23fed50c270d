//! jxp-sync server entry point.
//!
//! Starts the Axum HTTP trigger surface and the background sync
//! scheduler.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use anyhow::Context;

use jxp_sync::api;
use jxp_sync::app_state::AppState;
use jxp_sync::chain::{ChainClient, EthersChainClient};
use jxp_sync::config::SyncConfig;
use jxp_sync::domain::VolumeReward;
use jxp_sync::persistence::{PostgresStore, SyncStore};
use jxp_sync::service::{BatchSettler, EventFetcher, RewardCalculator, SyncOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Arc::new(SyncConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting jxp-sync");

    // Connect to PostgreSQL and run migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    let store = Arc::new(PostgresStore::new(pool));
    store.migrate().await?;
    let store: Arc<dyn SyncStore> = store;

    // Chain client (RPC provider + settlement signer)
    let chain: Arc<dyn ChainClient> = Arc::new(EthersChainClient::from_config(&config)?);

    // Build the sync pipeline
    let fetcher = EventFetcher::new(Arc::clone(&chain), Arc::clone(&store), config.deployment_block);
    let rule = Arc::new(VolumeReward::new(
        config.points_per_unit,
        config.volume_token_decimals,
    ));
    let calculator = RewardCalculator::new(Arc::clone(&store), rule);
    let settler = BatchSettler::new(Arc::clone(&store), Arc::clone(&chain));
    let orchestrator = Arc::new(SyncOrchestrator::new(
        fetcher,
        calculator,
        settler,
        Arc::clone(&store),
        Duration::from_secs(config.sync_interval_secs),
    ));

    // Background scheduler: one full cycle per interval. The first tick
    // fires immediately, catching up after a restart.
    let scheduled = Arc::clone(&orchestrator);
    let interval_secs = config.sync_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let report = scheduled.run_full_sync().await;
            if !report.success() {
                tracing::warn!(
                    run_id = %report.run_id,
                    errors = report.errors.len(),
                    "scheduled sync finished with errors"
                );
            }
        }
    });

    // Build application state
    let app_state = AppState {
        orchestrator,
        chain,
        store,
        config: Arc::clone(&config),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
