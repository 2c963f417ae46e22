//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for product storage and outbound notifications.
//!
//! # Modules
//!
//! - [`notifications`] - Out-of-stock alert delivery (log and no-op implementations)
//! - [`persistence`] - PostgreSQL and in-memory product repositories

pub mod notifications;
pub mod persistence;
