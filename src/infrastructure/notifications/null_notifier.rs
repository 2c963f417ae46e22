//! No-op notifier for tests or disabled alerts.

use super::service::{NotificationResult, Notifications};
use async_trait::async_trait;
use tracing::debug;

/// A notifier that drops every message.
pub struct NullNotifier;

impl NullNotifier {
    pub fn new() -> Self {
        debug!("Using NullNotifier (notifications disabled)");
        Self
    }
}

impl Default for NullNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifications for NullNotifier {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> NotificationResult<()> {
        Ok(())
    }
}
