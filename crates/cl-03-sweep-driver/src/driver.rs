//! Periodic sweep loop

use crate::config::SweepConfig;
use async_trait::async_trait;
use cl_01_document_lifecycle::{
    metrics, Contract, ContractLifecycleApi, Document, DocumentLifecycleApi, LifecycleResult,
    SystemTimeSource, TimeSource,
};
use shared_types::Timestamp;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// The two passes a tick runs.
#[async_trait]
pub trait SweepTarget: Send + Sync {
    async fn expire_documents(&self, now: Timestamp) -> LifecycleResult<Vec<Document>>;

    async fn execute_contracts(&self, now: Timestamp) -> LifecycleResult<Vec<Contract>>;
}

#[async_trait]
impl<T> SweepTarget for T
where
    T: DocumentLifecycleApi + ContractLifecycleApi,
{
    async fn expire_documents(&self, now: Timestamp) -> LifecycleResult<Vec<Document>> {
        DocumentLifecycleApi::sweep_expired(self, now).await
    }

    async fn execute_contracts(&self, now: Timestamp) -> LifecycleResult<Vec<Contract>> {
        ContractLifecycleApi::execute_due_contracts(self, now).await
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub expired: usize,
    pub executed: usize,
    /// Passes that failed outright.
    pub errors: usize,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.executed == 0 && self.errors == 0
    }
}

pub struct SweepDriver<T: SweepTarget> {
    target: Arc<T>,
    config: SweepConfig,
    clock: Arc<dyn TimeSource>,
}

impl<T: SweepTarget> SweepDriver<T> {
    pub fn new(target: Arc<T>, config: SweepConfig) -> Self {
        Self {
            target,
            config,
            clock: Arc::new(SystemTimeSource),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run one expiry pass then one execution pass.
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();

        match self.target.expire_documents(now).await {
            Ok(expired) => report.expired = expired.len(),
            Err(err) => {
                report.errors += 1;
                metrics::record_sweep_failure("expiry");
                warn!(error = %err, "Expiry pass failed");
            }
        }

        match self.target.execute_contracts(now).await {
            Ok(changed) => report.executed = changed.len(),
            Err(err) => {
                report.errors += 1;
                metrics::record_sweep_failure("execution");
                warn!(error = %err, "Clause execution pass failed");
            }
        }

        if report.is_empty() {
            debug!("Sweep tick found nothing to do");
        } else {
            info!(
                expired = report.expired,
                executed = report.executed,
                errors = report.errors,
                "Sweep tick complete"
            );
        }
        report
    }

    /// Tick every interval until `shutdown` flips to `true` or its sender
    /// drops. The first tick fires one full interval after start. A tick in
    /// progress always finishes before shutdown is observed.
    ///
    /// Returns the number of ticks run.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs(), "Sweep driver started");

        let mut ticks = 0u64;
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                    ticks += 1;
                }
            }
        }

        info!(ticks, "Sweep driver stopped");
        ticks
    }
}
