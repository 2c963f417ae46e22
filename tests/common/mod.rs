#![allow(dead_code)]

use allocation::application::{MessageBus, RetryPolicy, UnitOfWork, default_handlers};
use allocation::domain::events::Event;
use allocation::domain::repositories::ProductRepository;
use allocation::infrastructure::notifications::{NotificationResult, Notifications};
use allocation::infrastructure::persistence::InMemoryProductRepository;
use allocation::state::AppState;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const RECIPIENT: &str = "stock@made.com";

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifications for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> NotificationResult<()> {
        self.sent.lock().push(SentNotification {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 5,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

/// Store, bus and notifier wired the way the server wires them.
pub struct TestContext {
    pub repository: Arc<InMemoryProductRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub bus: Arc<MessageBus>,
}

impl TestContext {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryProductRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let registry = default_handlers(notifier.clone(), RECIPIENT);
        let bus = Arc::new(MessageBus::new(registry, fast_retry()));

        Self {
            repository,
            notifier,
            bus,
        }
    }

    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.repository.clone())
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.repository.clone(), self.bus.clone())
    }

    /// Dispatches each event in its own unit of work, panicking on failure.
    pub async fn handle_all(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.bus
                .handle(event, &self.unit_of_work())
                .await
                .unwrap();
        }
    }

    pub async fn available(&self, sku: &str, reference: &str) -> i64 {
        self.repository
            .find_by_sku(sku)
            .await
            .unwrap()
            .unwrap()
            .batch(reference)
            .unwrap()
            .available_quantity()
    }
}
