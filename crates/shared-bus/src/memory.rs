//! # In-Memory Notification Store
//!
//! Append-only commit log plus a live index for reads and toggles.
//! Suitable for single-node operation and tests; a database-backed store
//! would surface its own change stream through the same `ChangeFeed` trait.

use crate::feed::{ChangeFeed, NotificationEvent};
use crate::store::NotificationStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{
    NewNotification, Notification, NotificationId, NotificationKind, StoreError, Timestamp,
    UserId,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Default)]
struct StoreState {
    /// Every committed insert, in commit order.
    log: Vec<Notification>,
    /// Current notifications (reflects toggles and deletes).
    live: BTreeMap<NotificationId, Notification>,
    next_id: u64,
    last_timestamp: Option<Timestamp>,
    /// Set by `close`. Commits and feed reads check it under the same lock.
    closed: bool,
}

struct Shared {
    state: RwLock<StoreState>,
    /// Woken on every commit and on close.
    commits: Notify,
}

/// In-memory implementation of the notification store.
#[derive(Clone)]
pub struct InMemoryNotificationStore {
    shared: Arc<Shared>,
}

impl InMemoryNotificationStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(StoreState {
                    next_id: 1,
                    ..StoreState::default()
                }),
                commits: Notify::new(),
            }),
        }
    }

    /// Number of committed inserts so far.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.shared.state.read().log.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.read().closed
    }

    fn newest_first<F>(&self, predicate: F) -> Vec<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        self.shared
            .state
            .read()
            .live
            .values()
            .rev()
            .filter(|n| predicate(n))
            .cloned()
            .collect()
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert_many(
        &self,
        batch: Vec<NewNotification>,
    ) -> Result<Vec<NotificationId>, StoreError> {
        let ids = {
            let mut state = self.shared.state.write();
            if state.closed {
                return Err(StoreError::Unavailable("notification store closed".into()));
            }
            if batch.is_empty() {
                return Ok(Vec::new());
            }

            let mut ids = Vec::with_capacity(batch.len());
            for new in batch {
                let id = NotificationId(state.next_id);
                state.next_id += 1;

                // Timestamps never go backwards, even if the wall clock does.
                let now = Utc::now();
                let timestamp = match state.last_timestamp {
                    Some(last) if last > now => last,
                    _ => now,
                };
                state.last_timestamp = Some(timestamp);

                let committed = Notification::commit(new, id, timestamp);
                state.live.insert(id, committed.clone());
                state.log.push(committed);
                ids.push(id);
            }
            ids
        };

        debug!(count = ids.len(), "Notifications committed");
        self.shared.commits.notify_waiters();
        Ok(ids)
    }

    async fn get(&self, id: NotificationId) -> Result<Notification, StoreError> {
        self.shared
            .state
            .read()
            .live
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("notification {id}")))
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut found = self.newest_first(|n| &n.user_id == user);
        found.truncate(limit);
        Ok(found)
    }

    async fn unread_for_user(&self, user: &UserId) -> Result<Vec<Notification>, StoreError> {
        Ok(self.newest_first(|n| &n.user_id == user && !n.read))
    }

    async fn by_type(
        &self,
        user: &UserId,
        kind: NotificationKind,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(self.newest_first(|n| &n.user_id == user && n.kind == kind))
    }

    async fn set_read(&self, id: NotificationId, read: bool) -> Result<(), StoreError> {
        let mut state = self.shared.state.write();
        let notification = state
            .live
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("notification {id}")))?;
        notification.read = read;
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> Result<(), StoreError> {
        self.shared
            .state
            .write()
            .live
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("notification {id}")))
    }

    fn watch(&self) -> Box<dyn ChangeFeed> {
        let cursor = self.shared.state.read().log.len();
        debug!(cursor, "Change feed opened");
        Box::new(MemoryChangeFeed {
            shared: Arc::clone(&self.shared),
            cursor,
        })
    }

    fn close(&self) {
        self.shared.state.write().closed = true;
        self.shared.commits.notify_waiters();
        debug!("Notification store closed");
    }
}

/// Cursor over the commit log.
struct MemoryChangeFeed {
    shared: Arc<Shared>,
    cursor: usize,
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn next(&mut self) -> Option<NotificationEvent> {
        loop {
            // Register interest before checking the log so a commit landing
            // between the check and the await still wakes us.
            let notified = self.shared.commits.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let (next, closed) = {
                let state = self.shared.state.read();
                (state.log.get(self.cursor).cloned(), state.closed)
            };
            if let Some(notification) = next {
                let sequence = self.cursor as u64;
                self.cursor += 1;
                return Some(NotificationEvent {
                    sequence,
                    notification,
                });
            }

            if closed {
                return None;
            }

            notified.await;
        }
    }
}
