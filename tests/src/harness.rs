//! Shared fixtures for the integration flows.

use chrono::{Duration as ChronoDuration, Utc};
use cl_01_document_lifecycle::{
    InMemoryContractStore, InMemoryDocumentStore, InMemorySignerDirectory, LifecycleService,
    MockTimeSource, TimeSource, UploadRequest,
};
use cl_02_notification_hub::{
    ChangeFeedPump, ConnectionReceiver, FanoutHub, HubConfig, HubResult, PumpHandle,
};
use serde_json::Value;
use shared_bus::{InMemoryNotificationStore, NotificationStore};
use shared_types::{ContentHash, SignerKey};
use std::sync::Arc;
use std::time::Duration;

pub type Lifecycle =
    LifecycleService<InMemoryDocumentStore, InMemoryContractStore, InMemoryNotificationStore>;

/// Upper bound for any single expected delivery.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub fn key(name: &str) -> SignerKey {
    SignerKey::new(name)
}

/// Lifecycle service, notification store and hub wired together.
pub struct Harness {
    pub service: Arc<Lifecycle>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub directory: Arc<InMemorySignerDirectory>,
    pub hub: Arc<FanoutHub>,
    pub clock: Arc<MockTimeSource>,
}

impl Harness {
    pub fn new(hub_config: HubConfig) -> Self {
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let directory = Arc::new(InMemorySignerDirectory::new());
        let clock = Arc::new(MockTimeSource::new(Utc::now()));
        let service = Arc::new(
            LifecycleService::new(
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(InMemoryContractStore::new()),
                Arc::clone(&notifications),
                directory.clone(),
            )
            .with_clock(clock.clone()),
        );

        Self {
            service,
            notifications,
            directory,
            hub: Arc::new(FanoutHub::new(hub_config)),
            clock,
        }
    }

    pub fn start_pump(&self) -> HubResult<PumpHandle> {
        Ok(ChangeFeedPump::new(Arc::clone(&self.hub), self.notifications.watch())?.spawn())
    }

    /// Register a connection for `user` and hand back its receiving end.
    pub fn connect(&self, user: &str) -> HubResult<ConnectionReceiver> {
        let (connection, receiver) = self.hub.connection(key(user));
        self.hub.register(connection)?;
        Ok(receiver)
    }

    pub fn upload_request(
        &self,
        owner: &str,
        signers: &[&str],
        timeout: ChronoDuration,
    ) -> UploadRequest {
        UploadRequest {
            owner: key(owner),
            name: format!("{owner}-agreement"),
            required_signers: signers.iter().map(|s| key(s)).collect(),
            artifact_hash: ContentHash::of(owner.as_bytes()),
            timeout: self.clock.now() + timeout,
        }
    }
}

/// Next delivered payload, decoded. `None` on timeout or closed buffer.
pub async fn next_event(receiver: &mut ConnectionReceiver) -> Option<Value> {
    let payload = tokio::time::timeout(RECV_TIMEOUT, receiver.recv())
        .await
        .ok()
        .flatten()?;
    serde_json::from_str(&payload).ok()
}

/// The `metadata.event` field of a delivered payload.
pub fn event_name(event: &Value) -> Option<&str> {
    event.get("metadata")?.get("event")?.as_str()
}

/// True when nothing arrives within a short window.
pub async fn is_quiet(receiver: &mut ConnectionReceiver) -> bool {
    tokio::time::sleep(Duration::from_millis(50)).await;
    receiver.try_recv().is_none()
}
