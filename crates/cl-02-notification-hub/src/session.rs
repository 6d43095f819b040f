//! Connection session: one registered connection, one writer task, one
//! reader loop.
//!
//! The writer owns the outbound sink and stops when the connection buffer
//! closes. The reader runs on the caller's task; when either side ends the
//! connection is unregistered and the writer drains whatever is left.

use crate::error::HubResult;
use crate::hub::{ConnectionReceiver, FanoutHub};
use crate::ports::transport::{InboundMessage, InboundSource, OutboundSink};
use shared_types::UserId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub sent: u64,
    pub received: u64,
}

pub struct ConnectionSession;

impl ConnectionSession {
    /// Serve one connection until the peer leaves or the hub drops it.
    ///
    /// # Errors
    ///
    /// `TooManyConnections` if the user is at the limit; the sink is closed.
    pub async fn run<S, R>(
        hub: Arc<FanoutHub>,
        user_id: UserId,
        mut sink: S,
        mut source: R,
    ) -> HubResult<SessionSummary>
    where
        S: OutboundSink,
        R: InboundSource,
    {
        let (connection, receiver) = hub.connection(user_id.clone());
        let key = connection.key().clone();
        if let Err(err) = hub.register(connection) {
            sink.close().await;
            return Err(err);
        }
        info!(user_id = %user_id, connection_id = %key.id, "Connection opened");

        let mut writer = tokio::spawn(write_loop(receiver, sink));
        let mut writer_outcome = None;
        let mut received = 0u64;

        loop {
            tokio::select! {
                message = source.next() => match message {
                    Some(Ok(InboundMessage::Text(text))) => {
                        received += 1;
                        debug!(connection_id = %key.id, len = text.len(), "Inbound text ignored");
                    }
                    Some(Ok(InboundMessage::Binary(data))) => {
                        received += 1;
                        debug!(connection_id = %key.id, len = data.len(), "Inbound binary ignored");
                    }
                    Some(Ok(InboundMessage::Close)) | None => break,
                    Some(Err(err)) => {
                        warn!(connection_id = %key.id, error = %err, "Read failed");
                        break;
                    }
                },
                outcome = &mut writer => {
                    writer_outcome = Some(outcome);
                    break;
                }
            }
        }

        hub.unregister(&key);
        let outcome = match writer_outcome {
            Some(outcome) => outcome,
            None => writer.await,
        };
        let sent = outcome.unwrap_or_else(|err| {
            warn!(connection_id = %key.id, error = %err, "Writer task failed");
            0
        });

        info!(user_id = %user_id, connection_id = %key.id, sent, received, "Connection closed");
        Ok(SessionSummary { sent, received })
    }
}

async fn write_loop<S: OutboundSink>(mut receiver: ConnectionReceiver, mut sink: S) -> u64 {
    let mut sent = 0u64;
    while let Some(payload) = receiver.recv().await {
        if let Err(err) = sink.send(payload).await {
            debug!(connection_id = %receiver.key().id, error = %err, "Write failed");
            break;
        }
        sent += 1;
    }
    sink.close().await;
    sent
}
