//! Handler for the allocation endpoint.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::json;
use validator::Validate;

use crate::api::dto::allocation::{AllocateRequest, AllocateResponse};
use crate::application::HandlerOutput;
use crate::error::AppError;
use crate::state::AppState;

/// Allocates an order line to the preferred batch of its SKU.
///
/// # Endpoint
///
/// `POST /allocate`
///
/// # Request Body
///
/// ```json
/// { "order_id": "order-1", "sku": "SMALL-TABLE", "qty": 3 }
/// ```
///
/// # Response
///
/// ```json
/// { "batch_ref": "batch-001" }
/// ```
///
/// # Errors
///
/// - 400 Bad Request: `Invalid sku {sku}` or `Out of stock for sku {sku}`
/// - 5xx: storage failures persisting after retries
pub async fn allocate_handler(
    State(state): State<AppState>,
    Json(payload): Json<AllocateRequest>,
) -> Result<(StatusCode, Json<AllocateResponse>), AppError> {
    payload.validate()?;
    let order_id = payload.order_id.clone();

    let results = state
        .bus
        .handle(payload.into(), &state.unit_of_work())
        .await?;

    match results.into_iter().next() {
        Some(HandlerOutput::Allocated { batch_ref, .. }) => {
            Ok((StatusCode::CREATED, Json(AllocateResponse { batch_ref })))
        }
        Some(HandlerOutput::OutOfStock { sku, .. }) => Err(AppError::out_of_stock(&sku)),
        None => Err(AppError::internal(
            "Allocation produced no result",
            json!({ "order_id": order_id }),
        )),
    }
}
