//! # Change-Feed Pump
//!
//! The single task that turns committed notification inserts into hub
//! deliveries. Per-recipient delivery problems never stop it; the end of
//! the feed always does.

use crate::error::{HubError, HubResult};
use crate::hub::{FanoutHub, Payload};
use crate::metrics;
use shared_bus::{ChangeFeed, NotificationEvent};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Encode a notification the way clients receive it.
pub fn encode(event: &NotificationEvent) -> HubResult<Payload> {
    serde_json::to_string(&event.notification)
        .map(Payload::from)
        .map_err(|e| HubError::Encode(e.to_string()))
}

/// Releases the hub's pump slot when the pump goes away.
struct PumpSlot {
    hub: Arc<FanoutHub>,
}

impl Drop for PumpSlot {
    fn drop(&mut self) {
        self.hub.detach_pump();
        metrics::set_pump_running(false);
    }
}

/// Feed reader bound to one hub
pub struct ChangeFeedPump {
    slot: PumpSlot,
    feed: Box<dyn ChangeFeed>,
}

impl ChangeFeedPump {
    /// Attach a pump to `hub`.
    ///
    /// # Errors
    ///
    /// `PumpAlreadyRunning` if another pump is attached.
    pub fn new(hub: Arc<FanoutHub>, feed: Box<dyn ChangeFeed>) -> HubResult<Self> {
        hub.attach_pump()?;
        metrics::set_pump_running(true);
        Ok(Self {
            slot: PumpSlot { hub },
            feed,
        })
    }

    /// Run until the feed ends. Always returns an error.
    pub async fn run(mut self) -> HubResult<()> {
        info!("Change-feed pump started");
        let hub = Arc::clone(&self.slot.hub);
        let mut forwarded: u64 = 0;

        while let Some(event) = self.feed.next().await {
            let user_id = event.notification.user_id.clone();
            let payload = match encode(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    metrics::record_encode_failure();
                    warn!(sequence = event.sequence, error = %err, "Skipping unencodable notification");
                    continue;
                }
            };

            let report = hub.deliver(&user_id, payload);
            forwarded += 1;
            debug!(
                sequence = event.sequence,
                user_id = %user_id,
                delivered = report.delivered,
                dropped = report.dropped,
                "Notification routed"
            );
        }

        error!(forwarded, "Change feed closed, pump stopping");
        Err(HubError::FeedClosed)
    }

    /// Run on a dedicated task.
    pub fn spawn(self) -> PumpHandle {
        PumpHandle {
            task: tokio::spawn(self.run()),
        }
    }
}

/// Handle to a spawned pump
pub struct PumpHandle {
    task: JoinHandle<HubResult<()>>,
}

impl PumpHandle {
    /// Wait for the pump to stop and report why.
    pub async fn join(self) -> HubError {
        match self.task.await {
            Ok(Err(err)) => err,
            Ok(Ok(())) => HubError::FeedClosed,
            Err(join_err) => HubError::PumpAborted(join_err.to_string()),
        }
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
