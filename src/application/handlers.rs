//! Event handlers for the allocation workflow.
//!
//! Each handler opens its own scope on the [`UnitOfWork`] it is given, so a
//! handler's writes either all land or none do.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::message_bus::{EventHandler, HandlerOutput, HandlerRegistry};
use super::unit_of_work::UnitOfWork;
use crate::domain::entities::{Batch, OrderLine, Product};
use crate::domain::errors::DomainError;
use crate::domain::events::{Event, EventKind};
use crate::error::AppError;
use crate::infrastructure::notifications::Notifications;

/// Builds the registry used by the service: one handler per event kind.
pub fn default_handlers(
    notifier: Arc<dyn Notifications>,
    recipient: impl Into<String>,
) -> HandlerRegistry {
    HandlerRegistry::new()
        .with(EventKind::BatchCreated, Arc::new(AddBatch))
        .with(EventKind::BatchQuantityChanged, Arc::new(ChangeBatchQuantity))
        .with(EventKind::AllocationRequired, Arc::new(Allocate))
        .with(
            EventKind::OutOfStock,
            Arc::new(SendOutOfStockNotification::new(notifier, recipient)),
        )
}

fn unexpected_event(handler: &str, event: &Event) -> AppError {
    AppError::misrouted(
        "Handler received an event it does not handle",
        json!({ "handler": handler, "event": event.kind().as_str() }),
    )
}

/// Adds a batch, creating the product on first sight of its SKU.
pub struct AddBatch;

#[async_trait]
impl EventHandler for AddBatch {
    fn name(&self) -> &'static str {
        "add_batch"
    }

    async fn handle(
        &self,
        event: &Event,
        uow: &UnitOfWork,
    ) -> Result<Option<HandlerOutput>, AppError> {
        let Event::BatchCreated(e) = event else {
            return Err(unexpected_event(self.name(), event));
        };

        let mut scope = uow.begin();

        // References are unique across products, not only within one.
        if scope
            .products
            .get_by_batch_reference(&e.reference)
            .await?
            .is_some()
        {
            return Err(DomainError::DuplicateBatch {
                reference: e.reference.clone(),
            }
            .into());
        }

        let batch = Batch::new(&e.reference, &e.sku, e.qty, e.eta);

        match scope.products.get(&e.sku).await? {
            Some(product) => product.add_batch(batch)?,
            None => scope
                .products
                .add(Product::new(&e.sku, Vec::new()))?
                .add_batch(batch)?,
        }

        scope.commit().await?;
        info!(reference = %e.reference, sku = %e.sku, qty = e.qty, "Batch added");
        Ok(None)
    }
}

/// Allocates an order line to the product's preferred batch.
pub struct Allocate;

#[async_trait]
impl EventHandler for Allocate {
    fn name(&self) -> &'static str {
        "allocate"
    }

    async fn handle(
        &self,
        event: &Event,
        uow: &UnitOfWork,
    ) -> Result<Option<HandlerOutput>, AppError> {
        let Event::AllocationRequired(e) = event else {
            return Err(unexpected_event(self.name(), event));
        };

        let mut scope = uow.begin();
        let product = scope
            .products
            .get(&e.sku)
            .await?
            .ok_or_else(|| AppError::invalid_sku(&e.sku))?;

        let output = match product.allocate(OrderLine::new(&e.order_id, &e.sku, e.qty)) {
            Ok(batch_ref) => {
                info!(order_id = %e.order_id, sku = %e.sku, batch_ref = %batch_ref, "Order line allocated");
                HandlerOutput::Allocated {
                    order_id: e.order_id.clone(),
                    batch_ref,
                }
            }
            Err(DomainError::OutOfStock { sku }) => {
                info!(order_id = %e.order_id, sku = %sku, qty = e.qty, "Out of stock");
                HandlerOutput::OutOfStock {
                    order_id: e.order_id.clone(),
                    sku,
                }
            }
            Err(other) => return Err(other.into()),
        };

        // Committed on out-of-stock too, so the OutOfStock event is published.
        scope.commit().await?;
        Ok(Some(output))
    }
}

/// Applies a purchased-quantity correction; displaced lines come back as
/// `AllocationRequired` events.
pub struct ChangeBatchQuantity;

#[async_trait]
impl EventHandler for ChangeBatchQuantity {
    fn name(&self) -> &'static str {
        "change_batch_quantity"
    }

    async fn handle(
        &self,
        event: &Event,
        uow: &UnitOfWork,
    ) -> Result<Option<HandlerOutput>, AppError> {
        let Event::BatchQuantityChanged(e) = event else {
            return Err(unexpected_event(self.name(), event));
        };

        let mut scope = uow.begin();
        let product = scope
            .products
            .get_by_batch_reference(&e.reference)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("Unknown batch {}", e.reference),
                    json!({ "reference": e.reference }),
                )
            })?;

        product.change_batch_quantity(&e.reference, e.qty)?;
        let displaced = product.events().len();

        scope.commit().await?;
        info!(reference = %e.reference, qty = e.qty, displaced, "Batch quantity changed");
        Ok(None)
    }
}

/// Tells the stock administrators a SKU ran out. Delivery failures are logged
/// and swallowed.
pub struct SendOutOfStockNotification {
    notifier: Arc<dyn Notifications>,
    recipient: String,
}

impl SendOutOfStockNotification {
    pub fn new(notifier: Arc<dyn Notifications>, recipient: impl Into<String>) -> Self {
        Self {
            notifier,
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl EventHandler for SendOutOfStockNotification {
    fn name(&self) -> &'static str {
        "send_out_of_stock_notification"
    }

    async fn handle(
        &self,
        event: &Event,
        _uow: &UnitOfWork,
    ) -> Result<Option<HandlerOutput>, AppError> {
        let Event::OutOfStock(e) = event else {
            return Err(unexpected_event(self.name(), event));
        };

        let subject = format!("Out of stock for {}", e.sku);
        let body = format!(
            "No batch can satisfy the latest allocation request for {}.",
            e.sku
        );

        if let Err(err) = self.notifier.send(&self.recipient, &subject, &body).await {
            warn!(sku = %e.sku, error = %err, "Failed to send out-of-stock notification");
        }

        Ok(None)
    }
}
