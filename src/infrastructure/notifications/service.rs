//! Notification trait and error types.

use async_trait::async_trait;
use std::fmt;

/// Errors that can occur while delivering a notification.
#[derive(Debug)]
pub enum NotificationError {
    ConnectionError(String),
    DeliveryError(String),
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Notification connection error: {}", e),
            Self::DeliveryError(e) => write!(f, "Notification delivery error: {}", e),
        }
    }
}

impl std::error::Error for NotificationError {}

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Delivers short messages to people (stock administrators).
///
/// Delivery is fire-and-forget from the allocation flow's point of view: the
/// out-of-stock handler logs failures and carries on.
///
/// # Implementations
///
/// - [`crate::infrastructure::notifications::LogNotifier`] - structured log output
/// - [`crate::infrastructure::notifications::NullNotifier`] - discards everything
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifications: Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] if the message could not be delivered.
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> NotificationResult<()>;
}
