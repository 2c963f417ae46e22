//! Per-transaction identity map over a [`ProductRepository`].

use indexmap::IndexMap;
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::Product;
use crate::domain::events::Event;
use crate::domain::repositories::{ProductChange, ProductRepository};
use crate::error::AppError;

struct Tracked {
    product: Product,
    loaded_version: Option<i64>,
}

/// Repository view handed to handlers inside a [`crate::application::UnitOfWorkScope`].
///
/// Every product loaded or added is remembered, keyed by SKU, so repeated
/// lookups return the same in-memory instance and mutations accumulate until
/// commit. Nothing reaches the underlying store before then.
pub struct TrackingRepository {
    repository: Arc<dyn ProductRepository>,
    tracked: IndexMap<String, Tracked>,
}

impl TrackingRepository {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            repository,
            tracked: IndexMap::new(),
        }
    }

    /// Registers a product created in this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a product with the same SKU is
    /// already tracked.
    pub fn add(&mut self, product: Product) -> Result<&mut Product, AppError> {
        if self.tracked.contains_key(&product.sku) {
            return Err(AppError::conflict(
                "Product already exists",
                json!({ "sku": product.sku }),
            ));
        }

        let entry = self.tracked.entry(product.sku.clone()).or_insert(Tracked {
            product,
            loaded_version: None,
        });
        Ok(&mut entry.product)
    }

    /// Returns the product for `sku`, loading it on first access.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the underlying repository.
    pub async fn get(&mut self, sku: &str) -> Result<Option<&mut Product>, AppError> {
        if !self.tracked.contains_key(sku) {
            let Some(product) = self.repository.find_by_sku(sku).await? else {
                return Ok(None);
            };
            self.track_loaded(product);
        }

        Ok(self.tracked.get_mut(sku).map(|t| &mut t.product))
    }

    /// Returns the product owning the batch `reference`, loading it on first access.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the underlying repository.
    pub async fn get_by_batch_reference(
        &mut self,
        reference: &str,
    ) -> Result<Option<&mut Product>, AppError> {
        let known = self
            .tracked
            .values()
            .find(|t| t.product.batch(reference).is_some())
            .map(|t| t.product.sku.clone());

        let sku = match known {
            Some(sku) => sku,
            None => {
                let Some(product) = self.repository.find_by_batch_reference(reference).await?
                else {
                    return Ok(None);
                };
                let sku = product.sku.clone();
                if !self.tracked.contains_key(&sku) {
                    self.track_loaded(product);
                }
                sku
            }
        };

        Ok(self.tracked.get_mut(&sku).map(|t| &mut t.product))
    }

    /// Every product touched so far, in first-touch order.
    pub fn seen(&self) -> impl Iterator<Item = &Product> {
        self.tracked.values().map(|t| &t.product)
    }

    pub(crate) fn repository(&self) -> &Arc<dyn ProductRepository> {
        &self.repository
    }

    /// Products created or modified since they were loaded.
    pub(crate) fn changes(&self) -> Vec<ProductChange> {
        self.tracked
            .values()
            .filter_map(|t| match t.loaded_version {
                None => Some(ProductChange::created(t.product.clone())),
                Some(version) if version != t.product.version() => {
                    Some(ProductChange::updated(t.product.clone(), version))
                }
                Some(_) => None,
            })
            .collect()
    }

    /// Drains events from every tracked product, in first-touch order.
    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        self.tracked
            .values_mut()
            .flat_map(|t| t.product.take_events())
            .collect()
    }

    fn track_loaded(&mut self, product: Product) {
        let loaded_version = Some(product.version());
        self.tracked
            .insert(product.sku.clone(), Tracked { product, loaded_version });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Batch;
    use crate::domain::repositories::MockProductRepository;

    fn stored_product() -> Product {
        Product::restore("LAMP", vec![Batch::new("b1", "LAMP", 10, None)], 3)
    }

    #[tokio::test]
    async fn test_get_loads_once_and_returns_same_instance() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_sku()
            .withf(|sku| sku == "LAMP")
            .times(1)
            .returning(|_| Ok(Some(stored_product())));

        let mut repo = TrackingRepository::new(Arc::new(mock_repo));

        let product = repo.get("LAMP").await.unwrap().unwrap();
        product
            .allocate(crate::domain::entities::OrderLine::new("o1", "LAMP", 4))
            .unwrap();

        let again = repo.get("LAMP").await.unwrap().unwrap();
        assert_eq!(again.batch("b1").unwrap().available_quantity(), 6);
        assert_eq!(repo.seen().count(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_product_is_not_tracked() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_find_by_sku().returning(|_| Ok(None));

        let mut repo = TrackingRepository::new(Arc::new(mock_repo));

        assert!(repo.get("NOPE").await.unwrap().is_none());
        assert_eq!(repo.seen().count(), 0);
    }

    #[tokio::test]
    async fn test_get_by_batch_reference_uses_tracked_products_first() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_sku()
            .times(1)
            .returning(|_| Ok(Some(stored_product())));
        mock_repo.expect_find_by_batch_reference().times(0);

        let mut repo = TrackingRepository::new(Arc::new(mock_repo));
        repo.get("LAMP").await.unwrap();

        let product = repo.get_by_batch_reference("b1").await.unwrap().unwrap();
        assert_eq!(product.sku, "LAMP");
    }

    #[tokio::test]
    async fn test_changes_only_include_new_and_modified_products() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_sku()
            .withf(|sku| sku == "LAMP")
            .returning(|_| Ok(Some(stored_product())));

        let mut repo = TrackingRepository::new(Arc::new(mock_repo));
        repo.get("LAMP").await.unwrap();
        repo.add(Product::new("RUG", vec![])).unwrap();

        let changes = repo.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].product.sku, "RUG");
        assert_eq!(changes[0].expected_version, None);

        repo.get("LAMP")
            .await
            .unwrap()
            .unwrap()
            .change_batch_quantity("b1", 5)
            .unwrap();

        let changes = repo.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].expected_version, Some(3));
    }

    #[tokio::test]
    async fn test_add_rejects_tracked_sku() {
        let mut repo = TrackingRepository::new(Arc::new(MockProductRepository::new()));
        repo.add(Product::new("RUG", vec![])).unwrap();

        assert!(matches!(
            repo.add(Product::new("RUG", vec![])),
            Err(AppError::Conflict { .. })
        ));
    }
}
