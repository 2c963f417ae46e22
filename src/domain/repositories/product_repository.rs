//! Repository trait for product aggregate storage.

use crate::domain::entities::Product;
use crate::error::AppError;
use async_trait::async_trait;

/// A product to persist, with the version it had when it was loaded.
#[derive(Debug, Clone)]
pub struct ProductChange {
    pub product: Product,
    /// `None` for a product created in this transaction.
    pub expected_version: Option<i64>,
}

impl ProductChange {
    pub fn created(product: Product) -> Self {
        Self {
            product,
            expected_version: None,
        }
    }

    pub fn updated(product: Product, expected_version: i64) -> Self {
        Self {
            product,
            expected_version: Some(expected_version),
        }
    }
}

/// Durable storage for [`Product`] aggregates.
///
/// Loads always return a fresh copy; callers never share in-memory instances
/// across transactions.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgProductRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryProductRepository`] - process-local store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Loads the product for a SKU.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError>;

    /// Loads the product owning the batch with this reference.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_batch_reference(&self, reference: &str) -> Result<Option<Product>, AppError>;

    /// Persists all changes atomically: either every change is stored or none.
    ///
    /// Each updated product is written only if the stored version still equals
    /// [`ProductChange::expected_version`]; created products must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a version check fails or a created
    /// product already exists.
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn save_all(&self, changes: Vec<ProductChange>) -> Result<(), AppError>;

    /// Checks if the storage backend is reachable.
    async fn health_check(&self) -> bool;
}
