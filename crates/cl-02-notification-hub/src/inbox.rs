//! Recipient-scoped access to stored notifications
//!
//! The store does not know who is asking; this service makes sure only the
//! recipient reads, toggles or deletes a notification.

use crate::error::{HubError, HubResult};
use shared_bus::{NotificationStore, DEFAULT_LIST_LIMIT};
use shared_types::{Notification, NotificationId, NotificationKind, UserId};
use std::sync::Arc;
use tracing::debug;

pub struct Inbox<N: NotificationStore> {
    store: Arc<N>,
}

impl<N: NotificationStore> Inbox<N> {
    pub fn new(store: Arc<N>) -> Self {
        Self { store }
    }

    /// Newest first, at most `limit` (defaults to `DEFAULT_LIST_LIMIT`).
    pub async fn list(&self, user: &UserId, limit: Option<usize>) -> HubResult<Vec<Notification>> {
        Ok(self
            .store
            .list_for_user(user, limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await?)
    }

    pub async fn unread(&self, user: &UserId) -> HubResult<Vec<Notification>> {
        Ok(self.store.unread_for_user(user).await?)
    }

    pub async fn by_type(
        &self,
        user: &UserId,
        kind: NotificationKind,
    ) -> HubResult<Vec<Notification>> {
        Ok(self.store.by_type(user, kind).await?)
    }

    async fn owned(&self, user: &UserId, id: NotificationId) -> HubResult<Notification> {
        let notification = self.store.get(id).await?;
        if &notification.user_id != user {
            debug!(notification_id = %id, requester = %user, "Rejected non-recipient access");
            return Err(HubError::NotRecipient);
        }
        Ok(notification)
    }

    pub async fn mark_read(&self, user: &UserId, id: NotificationId) -> HubResult<()> {
        self.owned(user, id).await?;
        Ok(self.store.set_read(id, true).await?)
    }

    pub async fn mark_unread(&self, user: &UserId, id: NotificationId) -> HubResult<()> {
        self.owned(user, id).await?;
        Ok(self.store.set_read(id, false).await?)
    }

    pub async fn delete(&self, user: &UserId, id: NotificationId) -> HubResult<()> {
        self.owned(user, id).await?;
        Ok(self.store.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::InMemoryNotificationStore;
    use shared_types::{NewNotification, SignerKey, StoreError};

    async fn seeded() -> (Inbox<InMemoryNotificationStore>, NotificationId) {
        let store = Arc::new(InMemoryNotificationStore::new());
        let ids = store
            .insert_many(vec![NewNotification::new(
                SignerKey::new("alice"),
                NotificationKind::Document,
                "sign please",
            )])
            .await
            .unwrap();
        (Inbox::new(store), ids[0])
    }

    #[tokio::test]
    async fn test_recipient_can_toggle_and_delete() {
        let (inbox, id) = seeded().await;
        let alice = SignerKey::new("alice");

        inbox.mark_read(&alice, id).await.unwrap();
        assert!(inbox.unread(&alice).await.unwrap().is_empty());
        inbox.mark_unread(&alice, id).await.unwrap();
        assert_eq!(inbox.unread(&alice).await.unwrap().len(), 1);

        inbox.delete(&alice, id).await.unwrap();
        assert!(inbox.list(&alice, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_recipient_is_rejected() {
        let (inbox, id) = seeded().await;
        let mallory = SignerKey::new("mallory");

        assert_eq!(inbox.mark_read(&mallory, id).await, Err(HubError::NotRecipient));
        assert_eq!(inbox.delete(&mallory, id).await, Err(HubError::NotRecipient));
        assert_eq!(
            inbox.unread(&SignerKey::new("alice")).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_notification() {
        let (inbox, _) = seeded().await;
        let result = inbox.delete(&SignerKey::new("alice"), NotificationId(999)).await;
        assert!(matches!(result, Err(HubError::Store(StoreError::NotFound(_)))));
    }
}
