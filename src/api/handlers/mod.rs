//! HTTP request handlers for API endpoints.
//!
//! Each handler turns a request into an event and hands it to the message bus.

pub mod allocate;
pub mod batches;
pub mod health;

pub use allocate::allocate_handler;
pub use batches::{add_batch_handler, change_batch_quantity_handler};
pub use health::health_handler;
