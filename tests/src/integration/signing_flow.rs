//! # Signing Flow
//!
//! upload → sign → notification store → change feed → pump → hub → receiver
//!
//! Every committed notification reaches exactly the recipient's open
//! connections, in commit order.

#[cfg(test)]
mod tests {
    use crate::harness::{event_name, is_quiet, key, next_event, Harness};
    use chrono::Duration as ChronoDuration;
    use cl_01_document_lifecycle::{DocumentLifecycleApi, DocumentStatus, LifecycleError};
    use cl_02_notification_hub::{HubConfig, HubError, Inbox};
    use shared_bus::NotificationStore;
    use shared_types::{ContentHash, NotificationKind};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_two_signer_document_reaches_every_party() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let mut owner = h.connect("owner").unwrap();
        let mut s1 = h.connect("s1").unwrap();
        let mut s2 = h.connect("s2").unwrap();

        let doc = h
            .service
            .upload(h.upload_request("owner", &["s1", "s2"], ChronoDuration::days(1)))
            .await
            .unwrap();

        for rx in [&mut s1, &mut s2] {
            let event = next_event(rx).await.unwrap();
            assert_eq!(event_name(&event), Some("signature_requested"));
            assert_eq!(event["type"], "document");
            assert_eq!(event["metadata"]["documentId"], doc.key.0.to_string());
            assert_eq!(event["read"], false);
        }
        assert!(is_quiet(&mut owner).await, "owner is not asked to sign");

        h.service
            .sign(doc.key, key("s1"), ContentHash::of(b"s1-signed"))
            .await
            .unwrap();
        assert_eq!(event_name(&next_event(&mut owner).await.unwrap()), Some("signed"));
        assert_eq!(event_name(&next_event(&mut s2).await.unwrap()), Some("signed"));
        assert!(is_quiet(&mut s1).await, "the actor is not told about its own signature");

        let finalized = h
            .service
            .sign(doc.key, key("s2"), ContentHash::of(b"s2-signed"))
            .await
            .unwrap();
        assert_eq!(finalized.status, DocumentStatus::Finalized);
        assert_eq!(finalized.final_hash, Some(ContentHash::of(b"s2-signed")));

        for rx in [&mut owner, &mut s1, &mut s2] {
            assert_eq!(event_name(&next_event(rx).await.unwrap()), Some("finalized"));
        }
    }

    #[tokio::test]
    async fn test_deliveries_follow_commit_order() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let mut owner = h.connect("owner").unwrap();

        let doc = h
            .service
            .upload(h.upload_request("owner", &["a", "b", "c"], ChronoDuration::days(1)))
            .await
            .unwrap();
        for signer in ["a", "b"] {
            h.service
                .sign(doc.key, key(signer), ContentHash::of(signer.as_bytes()))
                .await
                .unwrap();
        }
        h.service.reject(doc.key, key("c")).await.unwrap();

        let mut ids = Vec::new();
        let mut events = Vec::new();
        for _ in 0..3 {
            let event = next_event(&mut owner).await.unwrap();
            ids.push(event["id"].as_u64().unwrap());
            events.push(event_name(&event).unwrap().to_string());
        }

        assert_eq!(events, vec!["signed", "signed", "rejected"]);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            h.service.get_document(doc.key).await.unwrap().status,
            DocumentStatus::Waiting,
            "rejection leaves the document waiting"
        );
    }

    #[tokio::test]
    async fn test_non_member_signature_is_refused_without_notifications() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let mut owner = h.connect("owner").unwrap();

        let doc = h
            .service
            .upload(h.upload_request("owner", &["s1"], ChronoDuration::days(1)))
            .await
            .unwrap();
        let committed = h.notifications.committed();

        let result = h
            .service
            .sign(doc.key, key("stranger"), ContentHash::of(b"x"))
            .await;

        assert!(matches!(result, Err(LifecycleError::NotEligible { .. })));
        assert_eq!(h.notifications.committed(), committed);
        assert!(is_quiet(&mut owner).await);
    }

    #[tokio::test]
    async fn test_inbox_reflects_pushed_notifications() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let mut s1 = h.connect("s1").unwrap();
        let inbox = Inbox::new(Arc::clone(&h.notifications));

        h.service
            .upload(h.upload_request("owner", &["s1"], ChronoDuration::days(1)))
            .await
            .unwrap();
        let pushed = next_event(&mut s1).await.unwrap();
        let id = shared_types::NotificationId(pushed["id"].as_u64().unwrap());

        let unread = inbox.unread(&key("s1")).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, id);
        assert_eq!(unread[0].kind, NotificationKind::Document);

        assert_eq!(
            inbox.mark_read(&key("owner"), id).await,
            Err(HubError::NotRecipient)
        );
        inbox.mark_read(&key("s1"), id).await.unwrap();
        assert!(inbox.unread(&key("s1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_close_stops_the_pump() {
        let h = Harness::new(HubConfig::default());
        let pump = h.start_pump().unwrap();
        assert!(h.hub.has_pump());

        h.notifications.close();

        let reason = tokio::time::timeout(crate::harness::RECV_TIMEOUT, pump.join())
            .await
            .unwrap();
        assert_eq!(reason, HubError::FeedClosed);
        assert!(!h.hub.has_pump());
    }
}
