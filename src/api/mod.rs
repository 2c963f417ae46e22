//! REST API layer for HTTP request/response handling.
//!
//! Translates HTTP requests into events for the message bus and formats
//! handler outputs as responses.
//!
//! # Modules
//!
//! - [`dto`] - Request/response payloads and their validation
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Request tracing
//! - [`routes`] - Route configuration
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
