//! # cl-02-notification-hub
//!
//! Real-time notification fan-out.
//!
//! ## Overview
//!
//! - **Registry**: `user → [Connection]` behind one lock
//! - **Non-blocking Delivery**: `try_send` into bounded per-connection buffers;
//!   a full buffer disconnects that connection and nothing else
//! - **Single Pump**: one task reads the change feed in commit order
//! - **Sessions**: per-connection writer task plus reader loop
//! - **Inbox**: recipient-only read, toggle and delete
//!
//! ## Architecture
//!
//! ```text
//! NotificationStore ──watch()──→ ChangeFeedPump ──deliver(user)──→ FanoutHub
//!                                                                     │
//!                                             ┌───────────────────────┤
//!                                             ▼                       ▼
//!                                  [buffer] writer task     [buffer] writer task
//!                                             │                       │
//!                                          socket                  socket
//! ```
//!
//! Ordering holds per connection while its buffer never overflows. There is
//! no ordering across users.

pub mod adapters;
pub mod error;
pub mod hub;
pub mod inbox;
pub mod metrics;
pub mod ports;
pub mod pump;
pub mod session;

pub use error::{HubError, HubResult, TransportError};
pub use hub::{
    Connection, ConnectionId, ConnectionKey, ConnectionReceiver, DeliveryReport, FanoutHub,
    HubConfig, Payload, DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_CONNECTIONS_PER_USER,
};
pub use inbox::Inbox;
pub use ports::{InboundMessage, InboundSource, OutboundSink};
pub use pump::{ChangeFeedPump, PumpHandle};
pub use session::{ConnectionSession, SessionSummary};
