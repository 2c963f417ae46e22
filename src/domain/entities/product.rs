//! Product aggregate: the consistency boundary for all batches of one SKU.

use super::{Batch, OrderLine};
use crate::domain::errors::DomainError;
use crate::domain::events::Event;

/// Aggregate root owning every [`Batch`] of one SKU.
///
/// All batch mutation goes through the product. `version` is bumped on every
/// successful mutation and compared by the store at commit time to detect
/// concurrent writers.
///
/// Events raised while mutating are kept in an in-memory outbox until the
/// unit of work drains them with [`Product::take_events`]. They are never
/// persisted.
#[derive(Debug, Clone)]
pub struct Product {
    pub sku: String,
    batches: Vec<Batch>,
    version: i64,
    events: Vec<Event>,
}

impl Product {
    /// Creates a product with version `0`.
    pub fn new(sku: impl Into<String>, batches: Vec<Batch>) -> Self {
        Self::restore(sku, batches, 0)
    }

    /// Rebuilds a product from stored state.
    pub fn restore(sku: impl Into<String>, batches: Vec<Batch>, version: i64) -> Self {
        Self {
            sku: sku.into(),
            batches,
            version,
            events: Vec::new(),
        }
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn batch(&self, reference: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.reference == reference)
    }

    /// Events raised since the last drain, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Adds a new batch of this product's SKU.
    ///
    /// # Errors
    ///
    /// - [`DomainError::SkuMismatch`] if the batch belongs to another SKU
    /// - [`DomainError::DuplicateBatch`] if the reference is already taken
    /// - [`DomainError::InvalidQuantity`] if the purchased quantity is negative
    pub fn add_batch(&mut self, batch: Batch) -> Result<(), DomainError> {
        if batch.purchased_quantity() < 0 {
            return Err(DomainError::InvalidQuantity {
                qty: batch.purchased_quantity(),
            });
        }
        if batch.sku != self.sku {
            return Err(DomainError::SkuMismatch {
                product_sku: self.sku.clone(),
                batch_sku: batch.sku,
            });
        }
        if self.batches.contains(&batch) {
            return Err(DomainError::DuplicateBatch {
                reference: batch.reference,
            });
        }

        self.batches.push(batch);
        self.version += 1;
        Ok(())
    }

    /// Allocates `line` to the preferred batch and returns its reference.
    ///
    /// Warehouse stock (no `eta`) is preferred over shipments, and sooner
    /// shipments over later ones. Batches with the same `eta` keep the
    /// product's batch order, so the choice is deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::OutOfStock`] when no batch can take the line. An
    /// [`Event::OutOfStock`] is recorded as well so notification can fire.
    /// A line for zero or fewer units is rejected with
    /// [`DomainError::InvalidQuantity`] and records nothing.
    pub fn allocate(&mut self, line: OrderLine) -> Result<String, DomainError> {
        if line.qty <= 0 {
            return Err(DomainError::InvalidQuantity { qty: line.qty });
        }

        let Some(batch) = self
            .batches
            .iter_mut()
            .filter(|b| b.can_allocate(&line))
            .min_by_key(|b| b.eta)
        else {
            self.events.push(Event::out_of_stock(&self.sku));
            return Err(DomainError::OutOfStock {
                sku: self.sku.clone(),
            });
        };

        let reference = batch.reference.clone();
        batch.allocate(line);
        self.version += 1;
        Ok(reference)
    }

    /// Corrects a batch's purchased quantity.
    ///
    /// If the batch ends up over-allocated, lines are deallocated from that
    /// batch only (largest quantity first, then oldest) until it is not, and
    /// an [`Event::AllocationRequired`] is recorded for each displaced line.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownBatch`] if no batch has `reference`, or
    /// [`DomainError::InvalidQuantity`] if `qty` is negative.
    pub fn change_batch_quantity(&mut self, reference: &str, qty: i64) -> Result<(), DomainError> {
        if qty < 0 {
            return Err(DomainError::InvalidQuantity { qty });
        }

        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.reference == reference)
            .ok_or_else(|| DomainError::UnknownBatch {
                reference: reference.to_string(),
            })?;

        batch.set_purchased_quantity(qty);
        while batch.available_quantity() < 0 {
            let Some(line) = batch.deallocate_one() else {
                break;
            };
            self.events
                .push(Event::allocation_required(line.order_id, line.sku, line.qty));
        }

        self.version += 1;
        Ok(())
    }
}
