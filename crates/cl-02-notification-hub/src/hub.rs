//! # Fan-out Hub
//!
//! Maps each user to their live connections and pushes payloads into each
//! connection's bounded buffer without ever waiting on it.
//!
//! A connection whose buffer is full (or whose writer is gone) is removed on
//! the spot. The hub holds the only sender, so removing it closes the
//! buffer: the writer drains what was queued and then closes the socket.

use crate::error::{HubError, HubResult};
use crate::metrics;
use parking_lot::Mutex;
use shared_types::UserId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default per-connection outbound buffer capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Default maximum concurrent connections per user.
pub const DEFAULT_MAX_CONNECTIONS_PER_USER: usize = 16;

/// Encoded message, shared across every connection of a user.
pub type Payload = Arc<str>;

/// Unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a registered connection for `unregister`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub user_id: UserId,
    pub id: ConnectionId,
}

/// Sending half of a connection, handed to the hub on `register`.
#[derive(Debug, Clone)]
pub struct Connection {
    key: ConnectionKey,
    sender: mpsc::Sender<Payload>,
}

/// Receiving half of a connection, owned by its writer task.
#[derive(Debug)]
pub struct ConnectionReceiver {
    key: ConnectionKey,
    receiver: mpsc::Receiver<Payload>,
}

impl Connection {
    /// Create a connection with a buffer of `capacity` payloads.
    pub fn channel(user_id: UserId, capacity: usize) -> (Self, ConnectionReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let key = ConnectionKey {
            user_id,
            id: ConnectionId::new(),
        };
        (
            Self {
                key: key.clone(),
                sender,
            },
            ConnectionReceiver { key, receiver },
        )
    }

    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }
}

impl ConnectionReceiver {
    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }

    /// Next buffered payload; `None` once the hub dropped the connection
    /// and the buffer is drained.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.receiver.recv().await
    }

    /// Non-blocking read, used by tests and draining writers.
    pub fn try_recv(&mut self) -> Option<Payload> {
        self.receiver.try_recv().ok()
    }
}

/// Hub limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    pub buffer_capacity: usize,
    pub max_connections_per_user: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_connections_per_user: DEFAULT_MAX_CONNECTIONS_PER_USER,
        }
    }
}

/// Outcome of a single `deliver` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections that accepted the payload.
    pub delivered: usize,
    /// Connections removed because their buffer was full or closed.
    pub dropped: usize,
}

/// Per-user connection registry
pub struct FanoutHub {
    config: HubConfig,
    connections: Mutex<HashMap<UserId, Vec<Connection>>>,
    pump_attached: AtomicBool,
}

impl FanoutHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            connections: Mutex::new(HashMap::new()),
            pump_attached: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> HubConfig {
        self.config
    }

    /// Open a connection sized from this hub's config. Not yet registered.
    pub fn connection(&self, user_id: UserId) -> (Connection, ConnectionReceiver) {
        Connection::channel(user_id, self.config.buffer_capacity)
    }

    /// Register a connection. Registering the same id twice is a no-op.
    pub fn register(&self, connection: Connection) -> HubResult<()> {
        let mut map = self.connections.lock();
        let list = map.entry(connection.key.user_id.clone()).or_default();

        if list.iter().any(|c| c.key.id == connection.key.id) {
            debug!(connection_id = %connection.key.id, "Duplicate registration ignored");
            return Ok(());
        }
        if list.len() >= self.config.max_connections_per_user {
            let user = connection.key.user_id.to_string();
            if list.is_empty() {
                map.remove(&connection.key.user_id);
            }
            warn!(user_id = %user, limit = self.config.max_connections_per_user, "Connection limit reached");
            return Err(HubError::TooManyConnections {
                user,
                limit: self.config.max_connections_per_user,
            });
        }

        debug!(
            user_id = %connection.key.user_id,
            connection_id = %connection.key.id,
            "Connection registered"
        );
        list.push(connection);
        metrics::inc_connections();
        Ok(())
    }

    /// Remove a connection. Returns whether anything was removed.
    pub fn unregister(&self, key: &ConnectionKey) -> bool {
        let mut map = self.connections.lock();
        let Some(list) = map.get_mut(&key.user_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|c| c.key.id != key.id);
        let removed = list.len() < before;
        if list.is_empty() {
            map.remove(&key.user_id);
        }
        if removed {
            metrics::dec_connections(1);
            debug!(user_id = %key.user_id, connection_id = %key.id, "Connection unregistered");
        }
        removed
    }

    /// Push `payload` to every connection of `user_id` without blocking.
    pub fn deliver(&self, user_id: &UserId, payload: Payload) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut map = self.connections.lock();
        let Some(list) = map.get_mut(user_id) else {
            return report;
        };

        list.retain(|conn| match conn.sender.try_send(Arc::clone(&payload)) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                report.dropped += 1;
                info!(
                    user_id = %user_id,
                    connection_id = %conn.key.id,
                    "Outbound buffer full, disconnecting"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                report.dropped += 1;
                debug!(user_id = %user_id, connection_id = %conn.key.id, "Writer gone, removing");
                false
            }
        });
        if list.is_empty() {
            map.remove(user_id);
        }
        drop(map);

        metrics::record_delivery(report.delivered, report.dropped);
        report
    }

    pub fn connection_count(&self, user_id: &UserId) -> usize {
        self.connections.lock().get(user_id).map_or(0, Vec::len)
    }

    pub fn total_connections(&self) -> usize {
        self.connections.lock().values().map(Vec::len).sum()
    }

    pub fn connected_users(&self) -> usize {
        self.connections.lock().len()
    }

    /// Claim the single pump slot.
    pub(crate) fn attach_pump(&self) -> HubResult<()> {
        self.pump_attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| HubError::PumpAlreadyRunning)
    }

    pub(crate) fn detach_pump(&self) {
        self.pump_attached.store(false, Ordering::Release);
    }

    pub fn has_pump(&self) -> bool {
        self.pump_attached.load(Ordering::Acquire)
    }
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
