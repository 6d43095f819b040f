//! # Sweep Flow
//!
//! The sweep driver moves overdue documents to `Expired` and advances
//! contract clauses, and the resulting notifications are pushed like any
//! other.

#[cfg(test)]
mod tests {
    use crate::harness::{event_name, is_quiet, key, next_event, Harness};
    use chrono::Duration as ChronoDuration;
    use cl_01_document_lifecycle::{
        Clause, ContractLifecycleApi, ContractStatus, DocumentLifecycleApi, DocumentStatus,
        LifecycleError,
    };
    use cl_02_notification_hub::HubConfig;
    use cl_03_sweep_driver::{SweepConfig, SweepDriver, TickReport};
    use shared_types::ContentHash;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    fn driver(h: &Harness, interval: Duration) -> SweepDriver<crate::harness::Lifecycle> {
        SweepDriver::new(Arc::clone(&h.service), SweepConfig::every(interval))
            .with_clock(h.clock.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_expires_overdue_document() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let mut owner = h.connect("owner").unwrap();

        let doc = h
            .service
            .upload(h.upload_request("owner", &["s1"], ChronoDuration::minutes(5)))
            .await
            .unwrap();
        h.clock.advance(ChronoDuration::minutes(6));

        let (stop_tx, stop_rx) = watch::channel(false);
        let sweep = tokio::spawn(driver(&h, Duration::from_secs(1)).run(stop_rx));

        let event = next_event(&mut owner).await.unwrap();
        assert_eq!(event_name(&event), Some("expired"));
        assert_eq!(event["metadata"]["documentId"], doc.key.0.to_string());

        stop_tx.send(true).unwrap();
        assert!(sweep.await.unwrap() >= 1);

        let stored = h.service.get_document(doc.key).await.unwrap();
        assert_eq!(stored.status, DocumentStatus::Expired);
        assert!(matches!(
            h.service
                .sign(doc.key, key("s1"), ContentHash::of(b"late"))
                .await,
            Err(LifecycleError::NotSignable { .. })
        ));
    }

    #[tokio::test]
    async fn test_finalized_document_survives_sweep() {
        let h = Harness::new(HubConfig::default());
        let doc = h
            .service
            .upload(h.upload_request("owner", &["s1"], ChronoDuration::minutes(5)))
            .await
            .unwrap();
        h.service
            .sign(doc.key, key("s1"), ContentHash::of(b"signed"))
            .await
            .unwrap();
        h.clock.advance(ChronoDuration::hours(1));

        let report = driver(&h, Duration::from_secs(60)).tick().await;

        assert_eq!(report, TickReport::default());
        assert_eq!(
            h.service.get_document(doc.key).await.unwrap().status,
            DocumentStatus::Finalized
        );
    }

    #[tokio::test]
    async fn test_dependent_clauses_execute_over_successive_ticks() {
        let h = Harness::new(HubConfig::default());
        let _pump = h.start_pump().unwrap();
        let mut participant = h.connect("buyer").unwrap();

        let contract = h
            .service
            .create_contract(key("seller"), "delivery".into(), vec![key("buyer")])
            .await
            .unwrap();
        assert_eq!(
            event_name(&next_event(&mut participant).await.unwrap()),
            Some("participant_added")
        );

        h.service
            .add_clause(contract.key, key("seller"), Clause::new("ship", "ship goods", "shipment"))
            .await
            .unwrap();
        h.service
            .add_clause(
                contract.key,
                key("seller"),
                Clause::new("pay", "release payment", "payment").depends_on("ship"),
            )
            .await
            .unwrap();
        for _ in 0..2 {
            assert_eq!(
                event_name(&next_event(&mut participant).await.unwrap()),
                Some("clause_added")
            );
        }

        let sweep = driver(&h, Duration::from_secs(60));

        assert_eq!(sweep.tick().await.executed, 1);
        let first = next_event(&mut participant).await.unwrap();
        assert_eq!(event_name(&first), Some("executed"));
        assert_eq!(first["metadata"]["clauseIds"], "ship");
        assert_eq!(
            h.service.get_contract(contract.key).await.unwrap().status,
            ContractStatus::Active
        );

        assert_eq!(sweep.tick().await.executed, 1);
        let second = next_event(&mut participant).await.unwrap();
        assert_eq!(second["metadata"]["clauseIds"], "pay");
        assert_eq!(
            h.service.get_contract(contract.key).await.unwrap().status,
            ContractStatus::Executed
        );

        assert_eq!(sweep.tick().await, TickReport::default());
        assert!(is_quiet(&mut participant).await);
    }

    #[tokio::test]
    async fn test_manual_clause_keeps_contract_active() {
        let h = Harness::new(HubConfig::default());
        let contract = h
            .service
            .create_contract(key("owner"), "retainer".into(), vec![])
            .await
            .unwrap();
        h.service
            .add_clause(
                contract.key,
                key("owner"),
                Clause::new("review", "annual review", "review").manual(),
            )
            .await
            .unwrap();

        let report = driver(&h, Duration::from_secs(60)).tick().await;

        assert_eq!(report.executed, 0);
        let stored = h.service.get_contract(contract.key).await.unwrap();
        assert_eq!(stored.status, ContractStatus::Active);
        assert!(stored.clauses[0].executed_at.is_none());
    }
}
