//! Error types for the Notification Hub subsystem

use shared_types::StoreError;
use thiserror::Error;

/// Hub errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The change feed ended; the pump cannot continue
    #[error("Change feed closed")]
    FeedClosed,

    /// A pump is already attached to this hub
    #[error("Change-feed pump already running")]
    PumpAlreadyRunning,

    /// The pump task panicked or was aborted
    #[error("Change-feed pump aborted: {0}")]
    PumpAborted(String),

    /// Per-user connection limit reached
    #[error("User {user} already has {limit} connections")]
    TooManyConnections { user: String, limit: usize },

    /// Requester does not own the notification
    #[error("Not the recipient of this notification")]
    NotRecipient,

    /// Notification store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Notification could not be encoded for the wire
    #[error("Encode error: {0}")]
    Encode(String),
}

/// Connection IO errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Connection closed")]
    Closed,
}

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;
