// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon status

use anyhow::Result;
use lock_daemon::DaemonClient;

use crate::error::CliError;

pub async fn handle(client: &DaemonClient) -> Result<()> {
    let version = client.hello().await.map_err(CliError::from)?;
    let status = client.status().await.map_err(CliError::from)?;

    println!("Status: running");
    println!("Address: {}", client.addr());
    println!("Version: {}", version);
    println!("Uptime: {}", format_uptime(status.uptime_secs));
    println!("Locks held: {}", status.locks_held);
    Ok(())
}

fn format_uptime(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{}s", s),
        (0, _) => format!("{}m {}s", m, s),
        _ => format!("{}h {}m {}s", h, m, s),
    }
}
