//! # Clausia Runtime
//!
//! Owns the stores and services and supervises the long-running tasks.
//!
//! ## Startup Sequence
//!
//! 1. Attach the change-feed pump to the hub
//! 2. Mark ready
//! 3. Start the sweep driver
//! 4. Serve the WebSocket endpoint
//!
//! ## Shutdown
//!
//! Triggered by the caller's signal or by the pump stopping. The pump
//! stopping is fatal: readiness drops and `run` returns an error.

use crate::config::RuntimeConfig;
use crate::endpoint::{self, EndpointState};
use cl_01_document_lifecycle::{
    InMemoryContractStore, InMemoryDocumentStore, InMemorySignerDirectory, LifecycleService,
};
use cl_02_notification_hub::{ChangeFeedPump, FanoutHub, HubError};
use cl_03_sweep_driver::SweepDriver;
use shared_bus::{InMemoryNotificationStore, NotificationStore};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Lifecycle service over the in-memory stores.
pub type Lifecycle =
    LifecycleService<InMemoryDocumentStore, InMemoryContractStore, InMemoryNotificationStore>;

/// How long shutdown waits for each task to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start notification pump: {0}")]
    PumpStart(#[source] HubError),

    #[error("Notification pump stopped: {0}")]
    PumpStopped(#[source] HubError),

    #[error("WebSocket server stopped: {0}")]
    Server(String),
}

/// Shared readiness flag.
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, ready: bool) {
        self.0.store(ready, Ordering::Release);
    }
}

pub struct ClausiaRuntime {
    config: RuntimeConfig,
    service: Arc<Lifecycle>,
    notifications: Arc<InMemoryNotificationStore>,
    directory: Arc<InMemorySignerDirectory>,
    hub: Arc<FanoutHub>,
    readiness: Readiness,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ClausiaRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        info!("Creating Clausia runtime");

        let notifications = Arc::new(InMemoryNotificationStore::new());
        let directory = Arc::new(InMemorySignerDirectory::new());
        for (email, key) in &config.signers {
            directory.register(email, key.clone());
        }

        let service = Arc::new(LifecycleService::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryContractStore::new()),
            Arc::clone(&notifications),
            directory.clone(),
        ));
        let hub = Arc::new(FanoutHub::new(config.hub_config()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            service,
            notifications,
            directory,
            hub,
            readiness: Readiness::default(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn service(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.service)
    }

    pub fn notifications(&self) -> Arc<InMemoryNotificationStore> {
        Arc::clone(&self.notifications)
    }

    pub fn directory(&self) -> Arc<InMemorySignerDirectory> {
        Arc::clone(&self.directory)
    }

    pub fn hub(&self) -> Arc<FanoutHub> {
        Arc::clone(&self.hub)
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    /// Bind the configured address and run until `signal` resolves.
    pub async fn run(self, signal: impl Future<Output = ()> + Send) -> Result<(), RuntimeError> {
        let addr = self.config.ws_bind;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RuntimeError::Bind { addr, source })?;
        self.run_on(listener, signal).await
    }

    /// Run on an already bound listener until `signal` resolves or the
    /// pump stops.
    pub async fn run_on(
        self,
        listener: TcpListener,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<(), RuntimeError> {
        let pump = ChangeFeedPump::new(self.hub(), self.notifications.watch())
            .map_err(RuntimeError::PumpStart)?
            .spawn();
        self.readiness.set(true);

        let sweep = tokio::spawn(
            SweepDriver::new(self.service(), self.config.sweep.clone())
                .run(self.shutdown_rx.clone()),
        );

        let router = endpoint::router(EndpointState {
            directory: self.directory.clone(),
            hub: self.hub(),
        });
        let mut server_shutdown = self.shutdown_rx.clone();
        let local_addr = listener.local_addr().ok();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.wait_for(|stop| *stop).await;
                })
                .await
        });
        info!(addr = ?local_addr, "WebSocket endpoint listening");

        let pump_exit = pump.join();
        tokio::pin!(pump_exit);
        tokio::pin!(signal);

        let mut pump_finished = false;
        let outcome = tokio::select! {
            _ = &mut signal => {
                info!("Shutdown requested");
                Ok(())
            }
            err = &mut pump_exit => {
                pump_finished = true;
                self.readiness.set(false);
                error!(error = %err, "Notification pump stopped, shutting down");
                Err(RuntimeError::PumpStopped(err))
            }
            result = &mut server => {
                let reason = match result {
                    Ok(Ok(())) => "exited".to_string(),
                    Ok(Err(err)) => err.to_string(),
                    Err(join_err) => join_err.to_string(),
                };
                error!(reason = %reason, "WebSocket server stopped unexpectedly");
                Err(RuntimeError::Server(reason))
            }
        };

        self.shutdown(pump_finished, pump_exit, sweep, server).await;
        outcome
    }

    async fn shutdown(
        &self,
        pump_finished: bool,
        pump_exit: impl Future<Output = HubError>,
        sweep: tokio::task::JoinHandle<u64>,
        server: tokio::task::JoinHandle<std::io::Result<()>>,
    ) {
        info!("Initiating graceful shutdown...");
        self.readiness.set(false);

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        self.notifications.close();
        if !pump_finished {
            match tokio::time::timeout(SHUTDOWN_GRACE, pump_exit).await {
                Ok(reason) => debug!(reason = %reason, "Notification pump stopped"),
                Err(_) => warn!("Notification pump did not stop in time"),
            }
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, sweep).await {
            Ok(Ok(ticks)) => debug!(ticks, "Sweep driver stopped"),
            Ok(Err(err)) => warn!(error = %err, "Sweep driver task failed"),
            Err(_) => warn!("Sweep driver did not stop in time"),
        }

        if !server.is_finished() {
            if tokio::time::timeout(SHUTDOWN_GRACE, server).await.is_err() {
                warn!("WebSocket server did not stop in time");
            }
        }

        info!("Shutdown complete");
    }
}
