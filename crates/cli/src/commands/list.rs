// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! List held locks

use anyhow::Result;
use lock_daemon::{DaemonClient, LockSummary};

use crate::error::CliError;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Print the locks as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub async fn handle(client: &DaemonClient, args: &ListArgs) -> Result<()> {
    let locks = client.list().await.map_err(CliError::from)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&locks)?);
    } else if locks.is_empty() {
        println!("No locks");
    } else {
        for lock in &locks {
            println!("{}", line(lock));
        }
    }
    Ok(())
}

fn line(lock: &LockSummary) -> String {
    format!(
        "{}: from pid {} on {} is locked: {}",
        lock.name, lock.pid, lock.addr, lock.locked
    )
}
