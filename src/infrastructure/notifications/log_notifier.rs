//! Notifier writing messages to the application log.

use super::service::{NotificationResult, Notifications};
use async_trait::async_trait;
use tracing::info;

/// Emits every notification as an `INFO` record on the `notifications` target.
///
/// Stands in for a mail gateway: operators route the target to wherever
/// alerts should go (log shipper, alerting rule).
#[derive(Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifications for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> NotificationResult<()> {
        info!(
            target: "notifications",
            recipient = recipient,
            subject = subject,
            body = body,
            "Notification sent"
        );
        Ok(())
    }
}
