// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquire, release, and force-release

use anyhow::Result;
use lock_daemon::client::caller_pid;
use lock_daemon::DaemonClient;
use tracing::{debug, info};

use crate::error::CliError;

/// Which lock to act on, and as whom. Accepted before or after the verb.
#[derive(clap::Args, Debug)]
pub struct LockArgs {
    /// Lock name
    #[arg(long = "lock", global = true, env = "LOCK_LOCK", default_value = "default")]
    pub name: String,

    /// Seconds to wait for a held lock (0 returns immediately)
    #[arg(
        long,
        global = true,
        env = "LOCK_TIMEOUT",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub timeout: i32,

    /// Token for force-release; must match the daemon's
    #[arg(long, global = true, env = "LOCK_FORCE_TOKEN", hide_env_values = true)]
    pub force_token: Option<String>,

    /// Holder pid to present (defaults to the invoking shell)
    #[arg(long, global = true, env = "LOCK_PID")]
    pub pid: Option<i32>,
}

impl LockArgs {
    fn holder_pid(&self) -> Result<i32, CliError> {
        match self.pid {
            Some(pid) => Ok(pid),
            None => caller_pid().map_err(CliError::from),
        }
    }
}

pub async fn acquire(client: &DaemonClient, args: &LockArgs) -> Result<()> {
    let pid = args.holder_pid()?;
    debug!(
        lock = %args.name,
        pid,
        timeout = args.timeout,
        daemon = %client.addr(),
        "requesting lock"
    );

    let reply = client
        .acquire(&args.name, pid, args.timeout)
        .await
        .map_err(CliError::from)?;
    if !reply.success {
        return Err(CliError::lock_not_acquired(&args.name, &reply.message).into());
    }

    info!(lock = %args.name, pid, "{}", reply.message);
    Ok(())
}

pub async fn release(client: &DaemonClient, args: &LockArgs) -> Result<()> {
    let pid = args.holder_pid()?;
    debug!(lock = %args.name, pid, daemon = %client.addr(), "releasing lock");

    let reply = client
        .release(&args.name, pid, None)
        .await
        .map_err(CliError::from)?;
    if !reply.success {
        return Err(CliError::lock_not_released(&args.name, &reply.message).into());
    }

    info!(lock = %args.name, pid, "{}", reply.message);
    Ok(())
}

pub async fn force_release(client: &DaemonClient, args: &LockArgs) -> Result<()> {
    let token = args.force_token.as_deref().unwrap_or_default();
    let pid = args.holder_pid()?;
    debug!(lock = %args.name, pid, daemon = %client.addr(), "force releasing lock");

    let reply = client
        .force_release(&args.name, pid, token)
        .await
        .map_err(CliError::from)?;
    if !reply.success {
        return Err(CliError::lock_not_released(&args.name, &reply.message).into());
    }

    info!(lock = %args.name, "{}", reply.message);
    Ok(())
}
