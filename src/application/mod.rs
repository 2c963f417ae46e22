//! Application layer: unit of work, message bus and event handlers.
//!
//! Every state change enters the system as an [`crate::domain::events::Event`]
//! handed to [`MessageBus::handle`]. Handlers open scopes on a [`UnitOfWork`],
//! mutate [`crate::domain::entities::Product`] aggregates through the scope's
//! [`TrackingRepository`] and commit; events those aggregates raise are fed
//! back into the bus until none remain.

pub mod handlers;
pub mod message_bus;
pub mod tracking_repository;
pub mod unit_of_work;

pub use handlers::default_handlers;
pub use message_bus::{EventHandler, HandlerOutput, HandlerRegistry, MessageBus, RetryPolicy};
pub use tracking_repository::TrackingRepository;
pub use unit_of_work::{UnitOfWork, UnitOfWorkScope};
