//! Handlers for batch endpoints.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::allocation::{AddBatchRequest, ChangeBatchQuantityRequest};
use crate::error::AppError;
use crate::state::AppState;

/// Registers a batch of stock.
///
/// # Endpoint
///
/// `POST /add_batch`
///
/// # Request Body
///
/// ```json
/// { "ref": "batch-001", "sku": "SMALL-TABLE", "qty": 20, "eta": "2011-01-02" }
/// ```
///
/// # Errors
///
/// - 400 Bad Request: validation failure or duplicate batch reference
/// - 409 Conflict: concurrent modification persisted after retries
pub async fn add_batch_handler(
    State(state): State<AppState>,
    Json(payload): Json<AddBatchRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .bus
        .handle(payload.into(), &state.unit_of_work())
        .await?;

    Ok(StatusCode::CREATED)
}

/// Corrects a batch's purchased quantity, reallocating displaced lines.
///
/// # Endpoint
///
/// `POST /change_batch_quantity`
///
/// # Request Body
///
/// ```json
/// { "ref": "batch-001", "qty": 5 }
/// ```
///
/// # Errors
///
/// - 400 Bad Request: validation failure
/// - 404 Not Found: no batch with that reference
pub async fn change_batch_quantity_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChangeBatchQuantityRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .bus
        .handle(payload.into(), &state.unit_of_work())
        .await?;

    Ok(StatusCode::OK)
}
