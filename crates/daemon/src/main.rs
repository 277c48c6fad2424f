// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock Daemon (lockd)
//!
//! Serves named locks to remote callers over TCP.

use clap::Parser;
use lock_daemon::{lifecycle, Args, Config, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from(Args::parse());

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!("Starting lockd on {}", config.listen_addr());

    // Start daemon
    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready, listening on {}", daemon.local_addr()?);

    // Signal ready for parent process (e.g., systemd, test harness)
    println!("READY");

    daemon
        .run(async {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
        })
        .await;

    daemon.shutdown().await?;

    info!("Daemon stopped");
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = match &config.log_path {
        Some(log_path) => {
            let dir = log_path.parent().ok_or(LifecycleError::NoLogDir)?;
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::never(
                dir,
                log_path.file_name().ok_or(LifecycleError::NoLogDir)?,
            );
            tracing_appender::non_blocking(file_appender)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
