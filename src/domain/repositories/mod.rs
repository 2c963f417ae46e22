//! Repository trait definitions for the domain layer.
//!
//! The store contract for [`crate::domain::entities::Product`] aggregates.
//! Implementations live in `crate::infrastructure::persistence`; the
//! per-transaction identity map lives in
//! [`crate::application::tracking_repository`].
//!
//! # Testing
//!
//! Mock implementations are auto-generated via `mockall` for unit tests.
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod product_repository;

pub use product_repository::{ProductChange, ProductRepository};

#[cfg(test)]
pub use product_repository::MockProductRepository;
