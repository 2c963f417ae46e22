//! Process-local product store.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;

use crate::domain::entities::Product;
use crate::domain::repositories::{ProductChange, ProductRepository};
use crate::error::AppError;

/// Product store backed by a `HashMap` behind a lock.
///
/// Used when no database is configured and in tests. Enforces the same
/// version checks and batch reference uniqueness as
/// [`super::PgProductRepository`], so concurrent writers get
/// [`AppError::Conflict`] here too.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with already-persisted products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|mut p| {
                p.take_events();
                (p.sku.clone(), p)
            })
            .collect();

        Self {
            products: RwLock::new(products),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        Ok(self.products.read().get(sku).cloned())
    }

    async fn find_by_batch_reference(&self, reference: &str) -> Result<Option<Product>, AppError> {
        Ok(self
            .products
            .read()
            .values()
            .find(|p| p.batch(reference).is_some())
            .cloned())
    }

    async fn save_all(&self, changes: Vec<ProductChange>) -> Result<(), AppError> {
        let mut products = self.products.write();
        let mut owners: HashMap<&str, &str> = HashMap::new();

        for change in &changes {
            let sku = change.product.sku.as_str();
            let stored = products.get(sku).map(Product::version);

            if stored != change.expected_version {
                return Err(AppError::conflict(
                    "Product was modified concurrently",
                    json!({
                        "sku": sku,
                        "expected_version": change.expected_version,
                        "stored_version": stored,
                    }),
                ));
            }

            for batch in change.product.batches() {
                let reference = batch.reference.as_str();
                let claimed_in_call = owners
                    .insert(reference, sku)
                    .is_some_and(|owner| owner != sku);
                let claimed_in_store = products
                    .values()
                    .any(|p| p.sku != sku && p.batch(reference).is_some());

                if claimed_in_call || claimed_in_store {
                    return Err(AppError::conflict(
                        "Batch reference belongs to another product",
                        json!({ "reference": reference, "sku": sku }),
                    ));
                }
            }
        }

        for ProductChange { mut product, .. } in changes {
            product.take_events();
            products.insert(product.sku.clone(), product);
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
