//! Connection transport ports
//!
//! A live connection is split into an outbound sink, driven by the writer
//! task, and an inbound source, driven by the reader loop.

use crate::error::TransportError;
use crate::hub::Payload;
use async_trait::async_trait;

/// Message received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Text(String),
    Binary(Vec<u8>),
    /// Client asked to close.
    Close,
}

/// Writing half of a connection
#[async_trait]
pub trait OutboundSink: Send + 'static {
    async fn send(&mut self, payload: Payload) -> Result<(), TransportError>;

    /// Best-effort close frame.
    async fn close(&mut self);
}

/// Reading half of a connection
#[async_trait]
pub trait InboundSource: Send {
    /// `None` once the peer is gone.
    async fn next(&mut self) -> Option<Result<InboundMessage, TransportError>>;
}
