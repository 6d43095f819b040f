//! # Delivery Isolation
//!
//! A connection that stops reading loses its place; the other connections
//! of the same user and of other users keep receiving.

#[cfg(test)]
mod tests {
    use crate::harness::{event_name, key, next_event, Harness};
    use cl_02_notification_hub::{
        ConnectionSession, HubConfig, HubError, InboundMessage, InboundSource, OutboundSink,
        Payload, TransportError,
    };
    use shared_bus::NotificationStore;
    use shared_types::{NewNotification, NotificationKind};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn notice(user: &str, message: &str) -> NewNotification {
        NewNotification::new(key(user), NotificationKind::Document, message)
            .with_meta("event", message)
    }

    #[tokio::test]
    async fn test_slow_connection_is_dropped_alone() {
        let h = Harness::new(HubConfig {
            buffer_capacity: 2,
            ..HubConfig::default()
        });
        let _pump = h.start_pump().unwrap();
        let mut fast = h.connect("u").unwrap();
        let mut slow = h.connect("u").unwrap();
        let mut other = h.connect("v").unwrap();
        assert_eq!(h.hub.connection_count(&key("u")), 2);

        for n in 1..=3 {
            let message = format!("m{n}");
            h.notifications
                .insert_many(vec![notice("u", &message), notice("v", &message)])
                .await
                .unwrap();
            let event = next_event(&mut fast).await.unwrap();
            assert_eq!(event_name(&event), Some(message.as_str()));
            assert_eq!(
                event_name(&next_event(&mut other).await.unwrap()),
                Some(message.as_str())
            );
        }

        assert_eq!(h.hub.connection_count(&key("u")), 1, "slow connection dropped");
        assert_eq!(h.hub.connection_count(&key("v")), 1);

        // The slow buffer keeps what it accepted, then reports closed.
        assert_eq!(event_name(&next_event(&mut slow).await.unwrap()), Some("m1"));
        assert_eq!(event_name(&next_event(&mut slow).await.unwrap()), Some("m2"));
        assert!(timeout(Duration::from_secs(1), slow.recv())
            .await
            .unwrap()
            .is_none());

        h.notifications
            .insert_many(vec![notice("u", "m4")])
            .await
            .unwrap();
        assert_eq!(event_name(&next_event(&mut fast).await.unwrap()), Some("m4"));
    }

    #[tokio::test]
    async fn test_user_without_connections_is_skipped() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let mut present = h.connect("present").unwrap();

        h.notifications
            .insert_many(vec![notice("absent", "first"), notice("present", "second")])
            .await
            .unwrap();

        assert_eq!(
            event_name(&next_event(&mut present).await.unwrap()),
            Some("second")
        );
        assert_eq!(h.notifications.committed(), 2, "stored even when nobody listens");
    }

    struct ChannelSink(mpsc::UnboundedSender<String>);

    #[async_trait::async_trait]
    impl OutboundSink for ChannelSink {
        async fn send(&mut self, payload: Payload) -> Result<(), TransportError> {
            self.0
                .send(payload.to_string())
                .map_err(|_| TransportError::Closed)
        }

        async fn close(&mut self) {}
    }

    struct ChannelSource(mpsc::UnboundedReceiver<InboundMessage>);

    #[async_trait::async_trait]
    impl InboundSource for ChannelSource {
        async fn next(&mut self) -> Option<Result<InboundMessage, TransportError>> {
            self.0.recv().await.map(Ok)
        }
    }

    #[tokio::test]
    async fn test_session_forwards_until_peer_closes() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let session = tokio::spawn(ConnectionSession::run(
            Arc::clone(&h.hub),
            key("u"),
            ChannelSink(out_tx),
            ChannelSource(in_rx),
        ));
        timeout(Duration::from_secs(1), async {
            while h.hub.connection_count(&key("u")) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        h.notifications
            .insert_many(vec![notice("u", "hello")])
            .await
            .unwrap();
        let written = timeout(Duration::from_secs(2), out_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["message"], "hello");
        assert_eq!(value["userId"], "u");

        in_tx.send(InboundMessage::Close).unwrap();
        let summary = timeout(Duration::from_secs(2), session)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(summary.sent, 1);
        assert_eq!(h.hub.connection_count(&key("u")), 0);
    }

    #[tokio::test]
    async fn test_connection_limit_applies_per_user() {
        let h = Harness::new(HubConfig {
            max_connections_per_user: 1,
            ..HubConfig::default()
        });
        let _first = h.connect("u").unwrap();

        assert!(matches!(
            h.connect("u"),
            Err(HubError::TooManyConnections { limit: 1, .. })
        ));
        assert!(h.connect("v").is_ok());
    }
}
