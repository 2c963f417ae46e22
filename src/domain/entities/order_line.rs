//! Order line value object.

use serde::{Deserialize, Serialize};

/// A request for `qty` units of `sku` on behalf of an order.
///
/// Value object: two lines with the same fields are the same line, which is
/// what makes allocating a line twice to the same batch a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: String,
    pub sku: String,
    pub qty: i64,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(order_id: impl Into<String>, sku: impl Into<String>, qty: i64) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            qty,
        }
    }
}
