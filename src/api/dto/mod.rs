//! Data Transfer Objects for API requests and responses.
//!
//! DTOs handle serialization/deserialization and validation of HTTP payloads.
//! Request DTOs convert into the [`crate::domain::events::Event`] they stand for.

pub mod allocation;
pub mod health;
