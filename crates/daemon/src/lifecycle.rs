// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, accept loop, shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use lock_core::{InMemoryLocker, LockManager, TracedLocker};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::server::{self, ServerContext};

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    /// TCP listener
    pub listener: TcpListener,
    /// Lock manager and settings shared with every connection
    pub context: Arc<ServerContext>,
}

impl DaemonState {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, LifecycleError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// Each connection is served on its own task so a waiting acquire never
    /// blocks other callers.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let ctx = Arc::clone(&self.context);
                            tokio::spawn(async move {
                                if let Err(e) = server::handle_connection(&ctx, stream, peer).await {
                                    error!("Error handling connection from {}: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                        }
                    }
                }

                () = &mut shutdown => break,
            }
        }
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // Held locks live only in memory
        let held = self.context.manager.list_locks();
        if !held.is_empty() {
            warn!("Dropping {} held locks on shutdown", held.len());
            for lock in &held {
                warn!("  - {} (pid {} on {})", lock.name, lock.pid, lock.addr);
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Could not determine log directory")]
    NoLogDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(addr.clone(), e))?;

    let manager = LockManager::with_locker(Arc::new(TracedLocker::new(InMemoryLocker::new())));
    let context = Arc::new(ServerContext::new(manager, config.force_token.clone()));

    if !config.force_release_enabled() {
        info!("No force token configured, force release is disabled");
    }

    info!("Daemon started on {}", listener.local_addr()?);

    Ok(DaemonState {
        config: config.clone(),
        listener,
        context,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
