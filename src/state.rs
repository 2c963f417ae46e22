//! Shared application state injected into HTTP handlers.

use std::sync::Arc;

use crate::application::{MessageBus, UnitOfWork};
use crate::domain::repositories::ProductRepository;

/// State shared by every request.
///
/// The store and the bus are shared; each request gets its own
/// [`UnitOfWork`] from [`AppState::unit_of_work`] so event outboxes never mix.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ProductRepository>,
    pub bus: Arc<MessageBus>,
}

impl AppState {
    pub fn new(repository: Arc<dyn ProductRepository>, bus: Arc<MessageBus>) -> Self {
        Self { repository, bus }
    }

    /// A fresh unit of work over the shared store.
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.repository.clone())
    }
}
