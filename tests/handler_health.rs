mod common;

use allocation::api::handlers::health_handler;
use allocation::application::{HandlerRegistry, MessageBus, RetryPolicy};
use allocation::domain::entities::Product;
use allocation::domain::repositories::{ProductChange, ProductRepository};
use allocation::error::AppError;
use allocation::state::AppState;
use async_trait::async_trait;
use axum::{Router, http::StatusCode, routing::get};
use axum_test::TestServer;
use common::TestContext;
use std::sync::Arc;

/// Store whose backend is always unreachable.
struct UnreachableRepository;

#[async_trait]
impl ProductRepository for UnreachableRepository {
    async fn find_by_sku(&self, _sku: &str) -> Result<Option<Product>, AppError> {
        Ok(None)
    }

    async fn find_by_batch_reference(&self, _reference: &str) -> Result<Option<Product>, AppError> {
        Ok(None)
    }

    async fn save_all(&self, _changes: Vec<ProductChange>) -> Result<(), AppError> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn test_health_endpoint_success() {
    let ctx = TestContext::new();
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(ctx.state());

    let server = TestServer::new(app).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["storage"]["status"], "ok");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_health_endpoint_degraded() {
    let bus = MessageBus::new(HandlerRegistry::new(), RetryPolicy::none());
    let state = AppState::new(Arc::new(UnreachableRepository), Arc::new(bus));
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["storage"]["status"], "error");
}
