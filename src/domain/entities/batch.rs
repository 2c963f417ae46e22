//! Batch entity: a shipment of one SKU that order lines are allocated to.

use chrono::NaiveDate;
use indexmap::IndexSet;
use std::cmp::Reverse;
use std::hash::{Hash, Hasher};

use super::OrderLine;

/// A discrete stock unit of one SKU with a purchased quantity and an optional
/// estimated arrival date.
///
/// Identity is the `reference`: two batches with the same reference are equal
/// whatever their other fields hold.
///
/// Allocations keep insertion order so that deallocation is deterministic
/// (see [`Batch::deallocate_one`]).
#[derive(Debug, Clone)]
pub struct Batch {
    pub reference: String,
    pub sku: String,
    pub eta: Option<NaiveDate>,
    purchased_quantity: i64,
    allocations: IndexSet<OrderLine>,
}

impl Batch {
    /// Creates a batch with no allocations.
    pub fn new(
        reference: impl Into<String>,
        sku: impl Into<String>,
        qty: i64,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            eta,
            purchased_quantity: qty,
            allocations: IndexSet::new(),
        }
    }

    /// Rebuilds a batch from stored state, keeping the given allocation order.
    ///
    /// Used by repositories. Lines are restored as-is, without the
    /// [`Batch::can_allocate`] check, so stored state is never silently dropped.
    pub fn restore(
        reference: impl Into<String>,
        sku: impl Into<String>,
        qty: i64,
        eta: Option<NaiveDate>,
        allocations: impl IntoIterator<Item = OrderLine>,
    ) -> Self {
        let mut batch = Self::new(reference, sku, qty, eta);
        batch.allocations.extend(allocations);
        batch
    }

    pub fn purchased_quantity(&self) -> i64 {
        self.purchased_quantity
    }

    pub fn allocated_quantity(&self) -> i64 {
        self.allocations.iter().map(|line| line.qty).sum()
    }

    /// Purchased minus allocated. Negative only right after a quantity
    /// correction, until [`crate::domain::entities::Product`] deallocates.
    pub fn available_quantity(&self) -> i64 {
        self.purchased_quantity - self.allocated_quantity()
    }

    /// Allocated lines in allocation order.
    pub fn allocations(&self) -> impl Iterator<Item = &OrderLine> {
        self.allocations.iter()
    }

    pub fn is_allocated(&self, line: &OrderLine) -> bool {
        self.allocations.contains(line)
    }

    /// A line fits when it is for this SKU, asks for at least one unit and
    /// does not exceed the available quantity.
    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        self.sku == line.sku && line.qty > 0 && self.available_quantity() >= line.qty
    }

    /// Allocates `line` if it fits. Allocating an already allocated line, or a
    /// line that does not fit, leaves the batch unchanged.
    pub fn allocate(&mut self, line: OrderLine) {
        if self.is_allocated(&line) || !self.can_allocate(&line) {
            return;
        }
        self.allocations.insert(line);
    }

    /// Removes `line` if it is allocated here.
    pub fn deallocate(&mut self, line: &OrderLine) {
        self.allocations.shift_remove(line);
    }

    /// Removes and returns the next line to displace: the largest quantity
    /// first, the earliest allocated among equal quantities.
    pub fn deallocate_one(&mut self) -> Option<OrderLine> {
        let index = self
            .allocations
            .iter()
            .enumerate()
            .min_by_key(|(index, line)| (Reverse(line.qty), *index))
            .map(|(index, _)| index)?;

        self.allocations.shift_remove_index(index)
    }

    pub(crate) fn set_purchased_quantity(&mut self, qty: i64) {
        self.purchased_quantity = qty;
    }
}

impl PartialEq for Batch {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Batch {}

impl Hash for Batch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}
