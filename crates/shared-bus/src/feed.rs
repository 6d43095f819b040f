//! # Change Feed
//!
//! Defines the reading side of the notification store.

use async_trait::async_trait;
use shared_types::Notification;

/// A committed insert as surfaced by the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Position in the store's commit log (0-based).
    pub sequence: u64,
    /// The notification exactly as committed.
    pub notification: Notification,
}

/// Ordered stream of committed notification inserts.
#[async_trait]
pub trait ChangeFeed: Send {
    /// Wait for the next committed event.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next event in commit order
    /// - `None` - The store was closed and every prior event was drained
    async fn next(&mut self) -> Option<NotificationEvent>;
}
