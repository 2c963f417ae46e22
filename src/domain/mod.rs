//! Domain layer containing the allocation model.
//!
//! This module has no dependencies on infrastructure or presentation layers.
//!
//! # Architecture
//!
//! - [`entities`] - Order lines, batches and the product aggregate
//! - [`events`] - Events raised by callers and by the model
//! - [`errors`] - Domain rule violations
//! - [`repositories`] - Persistence contract implemented by the infrastructure layer
//!
//! # Allocation Flow
//!
//! 1. A caller turns a request into an [`events::Event`]
//! 2. The message bus routes it to a handler, which opens a unit of work
//! 3. The handler loads a [`entities::Product`] and mutates it
//! 4. The unit of work commits and collects events the product raised
//! 5. Those events go back into the bus (e.g. out-of-stock notification)

pub mod entities;
pub mod errors;
pub mod events;
pub mod repositories;
