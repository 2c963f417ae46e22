//! Product repository implementations.
//!
//! # Repositories
//!
//! - [`PgProductRepository`] - PostgreSQL storage, one transaction per commit
//! - [`InMemoryProductRepository`] - Process-local storage for tests and
//!   database-less runs

pub mod in_memory_product_repository;
pub mod pg_product_repository;

pub use in_memory_product_repository::InMemoryProductRepository;
pub use pg_product_repository::PgProductRepository;
