//! Domain events dispatched through the message bus.
//!
//! Events are plain, timestamp-free records. They are created either by an
//! external caller (HTTP handler, admin CLI) or by the domain model while a
//! handler mutates a [`crate::domain::entities::Product`]. Each event is
//! consumed once per registered handler and then discarded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// New stock arrived (or is expected at `eta`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreated {
    pub reference: String,
    pub sku: String,
    pub qty: i64,
    pub eta: Option<NaiveDate>,
}

/// Correction to a batch's purchased quantity, e.g. after breakage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuantityChanged {
    pub reference: String,
    pub qty: i64,
}

/// Request to allocate an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequired {
    pub order_id: String,
    pub sku: String,
    pub qty: i64,
}

/// No batch could satisfy an allocation for `sku`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStock {
    pub sku: String,
}

/// Every event the bus knows how to route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BatchCreated(BatchCreated),
    BatchQuantityChanged(BatchQuantityChanged),
    AllocationRequired(AllocationRequired),
    OutOfStock(OutOfStock),
}

/// Discriminant of [`Event`], used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BatchCreated,
    BatchQuantityChanged,
    AllocationRequired,
    OutOfStock,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BatchCreated(_) => EventKind::BatchCreated,
            Event::BatchQuantityChanged(_) => EventKind::BatchQuantityChanged,
            Event::AllocationRequired(_) => EventKind::AllocationRequired,
            Event::OutOfStock(_) => EventKind::OutOfStock,
        }
    }

    pub fn batch_created(
        reference: impl Into<String>,
        sku: impl Into<String>,
        qty: i64,
        eta: Option<NaiveDate>,
    ) -> Self {
        Event::BatchCreated(BatchCreated {
            reference: reference.into(),
            sku: sku.into(),
            qty,
            eta,
        })
    }

    pub fn batch_quantity_changed(reference: impl Into<String>, qty: i64) -> Self {
        Event::BatchQuantityChanged(BatchQuantityChanged {
            reference: reference.into(),
            qty,
        })
    }

    pub fn allocation_required(
        order_id: impl Into<String>,
        sku: impl Into<String>,
        qty: i64,
    ) -> Self {
        Event::AllocationRequired(AllocationRequired {
            order_id: order_id.into(),
            sku: sku.into(),
            qty,
        })
    }

    pub fn out_of_stock(sku: impl Into<String>) -> Self {
        Event::OutOfStock(OutOfStock { sku: sku.into() })
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BatchCreated => "BatchCreated",
            EventKind::BatchQuantityChanged => "BatchQuantityChanged",
            EventKind::AllocationRequired => "AllocationRequired",
            EventKind::OutOfStock => "OutOfStock",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
