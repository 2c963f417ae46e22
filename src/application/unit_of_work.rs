//! Transactional boundary around product mutations.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::tracking_repository::TrackingRepository;
use crate::domain::events::Event;
use crate::domain::repositories::ProductRepository;
use crate::error::AppError;

/// Opens transactional scopes against a product store and collects the
/// events their aggregates raise.
///
/// Create one per request or command: the event outbox is shared by every
/// scope opened from the same instance, and [`crate::application::MessageBus`]
/// drains it after each handler.
#[derive(Clone)]
pub struct UnitOfWork {
    repository: Arc<dyn ProductRepository>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl UnitOfWork {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            repository,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Opens a new scope. Nothing is written until [`UnitOfWorkScope::commit`].
    pub fn begin(&self) -> UnitOfWorkScope {
        UnitOfWorkScope {
            products: TrackingRepository::new(self.repository.clone()),
            events: self.events.clone(),
            committed: false,
        }
    }

    /// Drains events published by committed scopes, oldest first.
    pub fn collect_new_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }
}

/// A single transaction.
///
/// Mutations made through [`UnitOfWorkScope::products`] are staged in memory.
/// [`UnitOfWorkScope::commit`] consumes the scope, so it can succeed at most
/// once; dropping the scope on any other path (early return, `?`, panic)
/// discards the staged work.
pub struct UnitOfWorkScope {
    pub products: TrackingRepository,
    events: Arc<Mutex<Vec<Event>>>,
    committed: bool,
}

impl UnitOfWorkScope {
    /// Writes every created or modified product in one atomic store call and
    /// publishes the events raised in this scope.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if another transaction changed one of
    /// the products since it was loaded. The scope is rolled back and its
    /// events are discarded.
    pub async fn commit(mut self) -> Result<(), AppError> {
        let changes = self.products.changes();
        let written = changes.len();

        if !changes.is_empty() {
            self.products.repository().save_all(changes).await?;
        }

        let events = self.products.take_events();
        debug!(products = written, events = events.len(), "Unit of work committed");

        self.events.lock().extend(events);
        self.committed = true;
        Ok(())
    }

    /// Discards all staged work.
    pub fn rollback(self) {
        drop(self);
    }
}

impl Drop for UnitOfWorkScope {
    fn drop(&mut self) {
        if !self.committed {
            debug!(
                products = self.products.seen().count(),
                "Unit of work rolled back"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Batch, OrderLine, Product};
    use crate::domain::repositories::MockProductRepository;
    use serde_json::json;

    fn stored_product() -> Product {
        Product::restore("CHAIR", vec![Batch::new("b1", "CHAIR", 1, None)], 7)
    }

    #[tokio::test]
    async fn test_commit_saves_changes_and_publishes_events() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_sku()
            .returning(|_| Ok(Some(stored_product())));
        mock_repo
            .expect_save_all()
            .withf(|changes| changes.len() == 1 && changes[0].expected_version == Some(7))
            .times(1)
            .returning(|_| Ok(()));

        let uow = UnitOfWork::new(Arc::new(mock_repo));
        let mut scope = uow.begin();
        let product = scope.products.get("CHAIR").await.unwrap().unwrap();
        product.allocate(OrderLine::new("o1", "CHAIR", 1)).unwrap();
        let _ = product.allocate(OrderLine::new("o2", "CHAIR", 1));
        scope.commit().await.unwrap();

        assert_eq!(uow.collect_new_events(), vec![Event::out_of_stock("CHAIR")]);
        assert!(uow.collect_new_events().is_empty());
    }

    #[tokio::test]
    async fn test_commit_without_changes_skips_store() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_sku()
            .returning(|_| Ok(Some(stored_product())));
        mock_repo.expect_save_all().times(0);

        let uow = UnitOfWork::new(Arc::new(mock_repo));
        let mut scope = uow.begin();
        scope.products.get("CHAIR").await.unwrap();

        scope.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_scope_writes_nothing() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_save_all().times(0);

        let uow = UnitOfWork::new(Arc::new(mock_repo));
        {
            let mut scope = uow.begin();
            scope.products.add(Product::new("NEW", vec![])).unwrap();
        }

        assert!(uow.collect_new_events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_discards_events() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_sku()
            .returning(|_| Ok(Some(stored_product())));
        mock_repo
            .expect_save_all()
            .returning(|_| Err(AppError::conflict("version mismatch", json!({}))));

        let uow = UnitOfWork::new(Arc::new(mock_repo));
        let mut scope = uow.begin();
        let product = scope.products.get("CHAIR").await.unwrap().unwrap();
        product.allocate(OrderLine::new("o1", "CHAIR", 1)).unwrap();
        product.change_batch_quantity("b1", 0).unwrap();
        assert_eq!(product.events().len(), 1);

        let result = scope.commit().await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
        assert!(uow.collect_new_events().is_empty());
    }
}
