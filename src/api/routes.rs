//! API route configuration.

use crate::api::handlers::{
    add_batch_handler, allocate_handler, change_batch_quantity_handler, health_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST /add_batch`             - Register a batch of stock
/// - `POST /allocate`              - Allocate an order line
/// - `POST /change_batch_quantity` - Correct a batch's purchased quantity
/// - `GET  /health`                - Storage health check
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/add_batch", post(add_batch_handler))
        .route("/allocate", post(allocate_handler))
        .route("/change_batch_quantity", post(change_batch_quantity_handler))
        .route("/health", get(health_handler))
}
