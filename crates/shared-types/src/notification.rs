//! # Notification Records
//!
//! A `NewNotification` is what the lifecycle engine writes; a `Notification`
//! is what the store commits and the change feed surfaces.

use crate::entities::{Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store-assigned notification identifier, increasing in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of the aggregate a notification talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Document,
    Contract,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Contract => "contract",
        }
    }
}

/// Notification as submitted for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl NewNotification {
    pub fn new(user_id: UserId, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            user_id,
            kind,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Committed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub read: bool,
    pub timestamp: Timestamp,
}

impl Notification {
    /// Materialize a submitted notification with store-assigned fields.
    pub fn commit(new: NewNotification, id: NotificationId, timestamp: Timestamp) -> Self {
        Self {
            id,
            user_id: new.user_id,
            kind: new.kind,
            message: new.message,
            metadata: new.metadata,
            read: false,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SignerKey;
    use chrono::Utc;

    #[test]
    fn test_commit_resets_read_flag() {
        let new = NewNotification::new(SignerKey::new("u1"), NotificationKind::Document, "hi")
            .with_meta("documentKey", "k");
        let committed = Notification::commit(new, NotificationId(7), Utc::now());

        assert_eq!(committed.id, NotificationId(7));
        assert!(!committed.read);
        assert_eq!(committed.metadata.get("documentKey").map(String::as_str), Some("k"));
    }

    #[test]
    fn test_json_field_names() {
        let new = NewNotification::new(SignerKey::new("u1"), NotificationKind::Contract, "m");
        let committed = Notification::commit(new, NotificationId(1), Utc::now());
        let value = serde_json::to_value(&committed).unwrap();

        assert_eq!(value["userId"], "u1");
        assert_eq!(value["type"], "contract");
        assert_eq!(value["read"], false);
        assert!(value.get("metadata").is_none());
    }
}
