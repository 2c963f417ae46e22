//! DTOs for batch and allocation endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::events::Event;

/// Request to register a new batch of stock.
#[derive(Debug, Deserialize, Validate)]
pub struct AddBatchRequest {
    #[serde(rename = "ref")]
    #[validate(length(min = 1, max = 255))]
    pub reference: String,

    #[validate(length(min = 1, max = 255))]
    pub sku: String,

    #[validate(range(min = 1))]
    pub qty: i64,

    /// ISO date (`2024-05-01`); `null` or absent for warehouse stock.
    #[serde(default)]
    pub eta: Option<NaiveDate>,
}

impl From<AddBatchRequest> for Event {
    fn from(r: AddBatchRequest) -> Self {
        Event::batch_created(r.reference, r.sku, r.qty, r.eta)
    }
}

/// Request to allocate an order line.
#[derive(Debug, Deserialize, Validate)]
pub struct AllocateRequest {
    #[validate(length(min = 1, max = 255))]
    pub order_id: String,

    #[validate(length(min = 1, max = 255))]
    pub sku: String,

    #[validate(range(min = 1))]
    pub qty: i64,
}

impl From<AllocateRequest> for Event {
    fn from(r: AllocateRequest) -> Self {
        Event::allocation_required(r.order_id, r.sku, r.qty)
    }
}

/// Successful allocation.
#[derive(Debug, Serialize)]
pub struct AllocateResponse {
    pub batch_ref: String,
}

/// Request to correct a batch's purchased quantity.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeBatchQuantityRequest {
    #[serde(rename = "ref")]
    #[validate(length(min = 1, max = 255))]
    pub reference: String,

    #[validate(range(min = 0))]
    pub qty: i64,
}

impl From<ChangeBatchQuantityRequest> for Event {
    fn from(r: ChangeBatchQuantityRequest) -> Self {
        Event::batch_quantity_changed(r.reference, r.qty)
    }
}
