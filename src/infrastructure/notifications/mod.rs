//! Outbound notifications (out-of-stock alerts).
//!
//! Provides a [`Notifications`] trait with two implementations:
//! - [`LogNotifier`] - Emits each message as a structured log record
//! - [`NullNotifier`] - No-op implementation for tests/disabled alerts

mod log_notifier;
mod null_notifier;
mod service;

pub use log_notifier::LogNotifier;
pub use null_notifier::NullNotifier;
pub use service::{NotificationError, NotificationResult, Notifications};

#[cfg(test)]
pub use service::MockNotifications;
