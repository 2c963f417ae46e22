//! Event dispatch with cascading follow-up events.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, warn};

use super::unit_of_work::UnitOfWork;
use crate::domain::events::{Event, EventKind};
use crate::error::AppError;

/// Value produced by a handler, returned to the caller of [`MessageBus::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutput {
    /// The order line was allocated to `batch_ref`.
    Allocated { order_id: String, batch_ref: String },
    /// No batch could take the order line.
    OutOfStock { order_id: String, sku: String },
}

/// A function of an event, run inside its own unit-of-work scope.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Handles one event.
    ///
    /// Events raised by aggregates during the handler's committed scopes are
    /// picked up by the bus afterwards through
    /// [`UnitOfWork::collect_new_events`].
    async fn handle(
        &self,
        event: &Event,
        uow: &UnitOfWork,
    ) -> Result<Option<HandlerOutput>, AppError>;
}

/// Mapping from event kind to its handlers, in registration order.
///
/// Built once at startup (see [`crate::application::handlers::default_handlers`])
/// and handed to the bus.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the handlers of `kind`.
    pub fn with(mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.entry(kind).or_default().push(handler);
        self
    }

    pub fn handlers_for(&self, kind: EventKind) -> &[Arc<dyn EventHandler>] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Bounded exponential backoff applied to each handler invocation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delays doubling from `base_delay`, capped at `max_delay`, with jitter.
    fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let factor = (self.base_delay.as_millis() as u64 / 2).max(1);

        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.max_retries)
    }
}

/// Routes events to handlers until no follow-up events remain.
pub struct MessageBus {
    registry: HandlerRegistry,
    retry: RetryPolicy,
}

impl MessageBus {
    pub fn new(registry: HandlerRegistry, retry: RetryPolicy) -> Self {
        Self { registry, retry }
    }

    /// Handles `event` and every event raised while handling it.
    ///
    /// Events are processed first-in first-out. Each handler of an event runs
    /// in registration order; events its scopes published are appended to the
    /// back of the queue. Outputs are returned in the order handlers finish.
    ///
    /// # Errors
    ///
    /// The first error a handler returns after exhausting its retries aborts
    /// the remaining queue and is returned as-is. Only errors for which
    /// [`AppError::is_retryable`] holds are retried.
    pub async fn handle(
        &self,
        event: Event,
        uow: &UnitOfWork,
    ) -> Result<Vec<HandlerOutput>, AppError> {
        let mut queue = VecDeque::from([event]);
        let mut results = Vec::new();

        while let Some(event) = queue.pop_front() {
            let kind = event.kind();
            let handlers = self.registry.handlers_for(kind);

            if handlers.is_empty() {
                debug!(event = %kind, "No handlers registered");
                continue;
            }

            for handler in handlers {
                debug!(event = %kind, handler = handler.name(), "Dispatching event");

                let output = self
                    .invoke(handler.as_ref(), &event, uow)
                    .await
                    .inspect_err(|e| {
                        error!(
                            event = %kind,
                            handler = handler.name(),
                            error = %e,
                            pending = queue.len(),
                            "Handler failed, aborting event processing"
                        )
                    })?;

                results.extend(output);
                queue.extend(uow.collect_new_events());
            }
        }

        Ok(results)
    }

    async fn invoke(
        &self,
        handler: &dyn EventHandler,
        event: &Event,
        uow: &UnitOfWork,
    ) -> Result<Option<HandlerOutput>, AppError> {
        RetryIf::spawn(
            self.retry.delays(),
            || handler.handle(event, uow),
            |e: &AppError| {
                let retryable = e.is_retryable();
                if retryable {
                    warn!(handler = handler.name(), error = %e, "Handler hit a transient error");
                }
                retryable
            },
        )
        .await
    }
}
