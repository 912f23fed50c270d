//! REST API layer: route handlers, DTOs, auth checks, and router
//! composition.
//!
//! The trigger endpoints (`/sync/*`, `/admin/*`) are guarded by shared
//! secrets; `/health` and `/stats` are open.

pub mod auth;
pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "jxp-sync",
        description = "Event-to-reward synchronization engine: DEX swap events in, settled JXP balances out."
    ),
    paths(
        handlers::sync::fetch_events,
        handlers::sync::full_sync,
        handlers::admin::manual_settle,
        handlers::admin::add_jxp,
        handlers::system::health_handler,
        handlers::system::stats_handler,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Sync", description = "Cron-triggered sync pipeline"),
        (name = "Admin", description = "Manual settlement and credits"),
        (name = "System", description = "Health and statistics"),
    )
)]
pub struct ApiDoc;

/// Registers the shared-secret header schemes used by the trigger
/// endpoints.
#[derive(Debug)]
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cron_secret",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(auth::CRON_SECRET_HEADER))),
            );
            components.add_security_scheme(
                "admin_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(auth::ADMIN_KEY_HEADER))),
            );
        }
    }
}

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::chain::mock::MockChain;
    use crate::config::SyncConfig;
    use crate::domain::VolumeReward;
    use crate::persistence::MemoryStore;
    use crate::service::{BatchSettler, EventFetcher, RewardCalculator, SyncOrchestrator};

    fn test_config() -> SyncConfig {
        SyncConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            database_url: String::new(),
            database_max_connections: 1,
            database_min_connections: 1,
            database_connect_timeout_secs: 1,
            rpc_url: String::new(),
            chain_id: 8453,
            settlement_signer_key: String::new(),
            points_contract: String::new(),
            pool_addresses: Vec::new(),
            deployment_block: 0,
            rpc_timeout_secs: 1,
            confirmation_timeout_secs: 1,
            confirmation_poll_ms: 10,
            sync_interval_secs: 300,
            points_per_unit: 10,
            volume_token_decimals: 18,
            cron_secret: "cron-secret".to_string(),
            admin_api_key: "admin-key".to_string(),
        }
    }

    fn test_state() -> (AppState, Arc<MockChain>, Arc<MemoryStore>) {
        let chain = Arc::new(MockChain::with_head(100));
        let store = Arc::new(MemoryStore::new());
        let chain_client = MockChain::shared(&chain);
        let sync_store = MemoryStore::shared(&store);
        let fetcher = EventFetcher::new(Arc::clone(&chain_client), Arc::clone(&sync_store), 0);
        let calculator =
            RewardCalculator::new(Arc::clone(&sync_store), Arc::new(VolumeReward::new(10, 18)));
        let settler = BatchSettler::new(Arc::clone(&sync_store), Arc::clone(&chain_client));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            fetcher,
            calculator,
            settler,
            Arc::clone(&sync_store),
            Duration::from_secs(300),
        ));
        let state = AppState {
            orchestrator,
            chain: chain_client,
            store: sync_store,
            config: Arc::new(test_config()),
        };
        (state, chain, store)
    }

    fn app() -> Router {
        let (state, _, _) = test_state();
        build_router().with_state(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn stats_reports_defaults_on_fresh_store() {
        let response = app()
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["totalProcessedSwaps"], 0);
        assert_eq!(json["totalJxpAwarded"], 0);
    }

    #[tokio::test]
    async fn sync_endpoints_reject_missing_secret() {
        for uri in ["/sync/fetch-events", "/sync/full"] {
            let response = app()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let json = body_json(response).await;
            assert_eq!(json["error"]["kind"], "authorization_failure");
        }
    }

    #[tokio::test]
    async fn fetch_events_with_secret_reports_new_swaps() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sync/fetch-events")
                    .header("x-cron-secret", "cron-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["newSwapsCount"], 0);
    }

    #[tokio::test]
    async fn full_sync_with_wrong_secret_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sync/full")
                    .header("x-cron-secret", "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn manual_settle_requires_admin_key_not_cron_secret() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/manual-settle")
                    .header("x-cron-secret", "cron-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/manual-settle")
                    .header("x-admin-key", "admin-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["userCount"], 0);
        assert_eq!(json["txHash"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn add_jxp_credits_chain_and_skips_ledger() {
        let (state, chain, store) = test_state();
        let router = build_router().with_state(state);

        let body = serde_json::json!({
            "address": "0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae",
            "amount": 25
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/add-jxp")
                    .header("x-admin-key", "admin-key")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["txHash"].as_str().unwrap().starts_with("0x"));

        let credits = chain.single_credits.lock().await;
        assert_eq!(credits.len(), 1);
        let (address, amount) = credits.first().unwrap().clone();
        assert_eq!(address, "0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae");
        assert_eq!(amount, 25);
        drop(credits);
        assert_eq!(
            store.pending_of("0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae").await,
            0
        );
    }

    #[tokio::test]
    async fn add_jxp_rejects_bad_address_and_zero_amount() {
        for body in [
            serde_json::json!({"address": "not-an-address", "amount": 5}),
            serde_json::json!({"address": "0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae", "amount": 0}),
        ] {
            let response = app()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/admin/add-jxp")
                        .header("x-admin-key", "admin-key")
                        .header("content-type", "application/json")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = body_json(response).await;
            assert_eq!(json["error"]["kind"], "validation_failure");
        }
    }
}
