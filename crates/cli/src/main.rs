// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lock - named locks held on a lockd server
//!
//! With no verb, acquires the lock. Locks are owned by the invoking shell's
//! pid and this host's address, so a later `lock release` from the same
//! shell frees them.

mod commands;
mod error;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{list, lock, status};

use lock_daemon::DaemonClient;

use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "lock",
    version,
    about = "Acquire and release named locks on a lockd server"
)]
struct Cli {
    /// Daemon host
    #[arg(long, global = true, env = "LOCK_HOST", default_value = "localhost")]
    host: String,

    /// Daemon port
    #[arg(long, global = true, env = "LOCK_PORT", default_value_t = 50051)]
    port: u16,

    #[command(flatten)]
    lock: lock::LockArgs,

    /// Enables verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire the lock (the default)
    Acquire,
    /// Release a lock held by this shell
    Release,
    /// Release a lock whoever holds it
    ForceRelease,
    /// List held locks
    List(list::ListArgs),
    /// Show daemon status
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CliError>() {
                Some(friendly) => eprint!("{}", friendly),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = DaemonClient::new(cli.host, cli.port);

    match cli.command.unwrap_or(Commands::Acquire) {
        Commands::Acquire => lock::acquire(&client, &cli.lock).await,
        Commands::Release => lock::release(&client, &cli.lock).await,
        Commands::ForceRelease => lock::force_release(&client, &cli.lock).await,
        Commands::List(args) => list::handle(&client, &args).await,
        Commands::Status => status::handle(&client).await,
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
