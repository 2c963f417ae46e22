//! Core domain entities of the allocation model.
//!
//! Pure logic, no I/O. Repositories in [`crate::infrastructure::persistence`]
//! load and store these types; handlers in [`crate::application`] mutate them
//! inside a unit of work.
//!
//! # Entity Types
//!
//! - [`OrderLine`] - Value object: an order's request for a quantity of a SKU
//! - [`Batch`] - A shipment of one SKU that lines are allocated to
//! - [`Product`] - Aggregate root owning all batches of one SKU

pub mod batch;
pub mod order_line;
pub mod product;

pub use batch::Batch;
pub use order_line::OrderLine;
pub use product::Product;
