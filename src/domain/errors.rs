//! Errors raised by the allocation domain model.

/// Rule violations reported by [`crate::domain::entities::Product`].
///
/// These never indicate a fault in the system: callers decide whether the
/// condition becomes a client error or, as with [`DomainError::OutOfStock`],
/// an event that triggers further handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// No batch of the product can satisfy the requested quantity.
    #[error("Out of stock for sku {sku}")]
    OutOfStock { sku: String },

    /// The product owns no batch with this reference.
    #[error("Unknown batch {reference}")]
    UnknownBatch { reference: String },

    /// A batch for another SKU was offered to the product.
    #[error("Batch sku {batch_sku} does not match product sku {product_sku}")]
    SkuMismatch {
        product_sku: String,
        batch_sku: String,
    },

    /// The product already owns a batch with this reference.
    #[error("Batch {reference} already exists")]
    DuplicateBatch { reference: String },

    /// Order lines need a positive quantity, batches a non-negative one.
    #[error("Invalid quantity {qty}")]
    InvalidQuantity { qty: i64 },
}
