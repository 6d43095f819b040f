//! axum WebSocket transport
//!
//! Splits an upgraded socket into the sink/source pair a
//! `ConnectionSession` drives. Pings are answered by the protocol layer
//! and never reach the session.

use crate::error::{HubResult, TransportError};
use crate::hub::{FanoutHub, Payload};
use crate::ports::transport::{InboundMessage, InboundSource, OutboundSink};
use crate::session::{ConnectionSession, SessionSummary};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use shared_types::UserId;
use std::sync::Arc;
use tracing::debug;

/// Writing half of a WebSocket
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

/// Reading half of a WebSocket
pub struct WsSource {
    inner: SplitStream<WebSocket>,
}

/// Split an upgraded socket.
pub fn split(socket: WebSocket) -> (WsSink, WsSource) {
    let (sink, stream) = socket.split();
    (WsSink { inner: sink }, WsSource { inner: stream })
}

#[async_trait]
impl OutboundSink for WsSink {
    async fn send(&mut self, payload: Payload) -> Result<(), TransportError> {
        self.inner
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(err) = self.inner.send(Message::Close(None)).await {
            debug!(error = %err, "Close frame not sent");
        }
        let _ = self.inner.close().await;
    }
}

#[async_trait]
impl InboundSource for WsSource {
    async fn next(&mut self) -> Option<Result<InboundMessage, TransportError>> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(err) => return Some(Err(TransportError::Receive(err.to_string()))),
            };
            match message {
                Message::Text(text) => return Some(Ok(InboundMessage::Text(text))),
                Message::Binary(data) => return Some(Ok(InboundMessage::Binary(data))),
                Message::Close(_) => return Some(Ok(InboundMessage::Close)),
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }
    }
}

/// Serve an upgraded socket for `user_id` until it closes.
pub async fn serve_socket(
    hub: Arc<FanoutHub>,
    user_id: UserId,
    socket: WebSocket,
) -> HubResult<SessionSummary> {
    let (sink, source) = split(socket);
    ConnectionSession::run(hub, user_id, sink, source).await
}
