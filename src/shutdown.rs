use std::sync::Arc;

use actix_web::dev::ServerHandle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::store::RecordStore;

/// HTTP server running in the background
pub struct ServerTask {
    pub handle: ServerHandle,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

/// Handles graceful shutdown of the application
///
/// This module orchestrates graceful shutdown by:
/// 1. Listening for shutdown signals (SIGTERM, SIGINT/CTRL+C)
/// 2. Stopping the HTTP server (stops accepting new requests)
/// 3. Signaling the scheduler to stop after its current cycle
/// 4. Waiting for background tasks to finish
/// 5. Closing the record store
pub struct ShutdownCoordinator {
    server: Option<ServerTask>,
    worker_handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    store: Arc<dyn RecordStore>,
}

impl ShutdownCoordinator {
    pub fn new(
        server: Option<ServerTask>,
        worker_handles: Vec<JoinHandle<()>>,
        shutdown_tx: watch::Sender<bool>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            server,
            worker_handles,
            shutdown_tx,
            store,
        }
    }

    /// Wait for a shutdown signal, then shut everything down
    pub async fn wait_for_shutdown(self) -> Result<(), std::io::Error> {
        wait_for_signal().await;
        self.shutdown().await
    }

    async fn shutdown(self) -> Result<(), std::io::Error> {
        if let Some(server) = &self.server {
            info!("Stopping HTTP server (no longer accepting new requests)...");
            server.handle.stop(true).await;
            info!("HTTP server stopped accepting new requests");
        }

        info!("Signaling background tasks to stop...");
        if let Err(e) = self.shutdown_tx.send(true) {
            // no receiver left: every task already finished
            info!("No background task listening for shutdown: {:?}", e);
        }

        let num_workers = self.worker_handles.len();
        info!("Waiting for {} background tasks to finish...", num_workers);
        for (i, handle) in self.worker_handles.into_iter().enumerate() {
            match handle.await {
                Ok(()) => info!("Background task {} stopped ({}/{})", i + 1, i + 1, num_workers),
                Err(e) => error!("Background task {} failed to stop: {:?}", i + 1, e),
            }
        }

        if let Some(server) = self.server {
            info!("Waiting for HTTP server to fully shut down...");
            match server.task.await {
                Ok(Ok(())) => info!("HTTP server shut down successfully"),
                Ok(Err(e)) => error!("HTTP server encountered error during shutdown: {:?}", e),
                Err(e) => error!("HTTP server task panicked: {:?}", e),
            }
        }

        self.store.close().await;

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}

/// Resolve on CTRL+C, or SIGTERM on Unix
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown...");
        }
    }
}
