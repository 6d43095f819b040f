//! # Notification Store
//!
//! Defines the persistence contract for notifications.

use crate::feed::ChangeFeed;
use async_trait::async_trait;
use shared_types::{
    NewNotification, Notification, NotificationId, NotificationKind, StoreError, UserId,
};

/// Trait for persisting notifications and watching committed inserts.
///
/// The store does not check who mutates a notification. Recipient-only
/// access is the caller's responsibility.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a batch, assigning `id`, `timestamp` and `read = false`.
    ///
    /// # Returns
    ///
    /// The assigned identifiers, in batch order.
    async fn insert_many(
        &self,
        batch: Vec<NewNotification>,
    ) -> Result<Vec<NotificationId>, StoreError>;

    /// Fetch a single notification.
    async fn get(&self, id: NotificationId) -> Result<Notification, StoreError>;

    /// Most recent notifications for a user, newest first.
    async fn list_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError>;

    /// All unread notifications for a user, newest first.
    async fn unread_for_user(&self, user: &UserId) -> Result<Vec<Notification>, StoreError>;

    /// All notifications of one kind for a user, newest first.
    async fn by_type(
        &self,
        user: &UserId,
        kind: NotificationKind,
    ) -> Result<Vec<Notification>, StoreError>;

    /// Toggle the read flag.
    async fn set_read(&self, id: NotificationId, read: bool) -> Result<(), StoreError>;

    /// Remove a notification.
    async fn delete(&self, id: NotificationId) -> Result<(), StoreError>;

    /// Open a feed positioned at the current log head.
    fn watch(&self) -> Box<dyn ChangeFeed>;

    /// Stop accepting inserts and end every open feed once drained.
    fn close(&self);
}
