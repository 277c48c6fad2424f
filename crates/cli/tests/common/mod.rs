// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use lock_daemon::{startup, Config};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

/// Variables that would otherwise leak from the developer's shell.
const CLIENT_ENV: &[&str] = &[
    "LOCK_HOST",
    "LOCK_PORT",
    "LOCK_LOCK",
    "LOCK_TIMEOUT",
    "LOCK_FORCE_TOKEN",
    "LOCK_PID",
    "LOCK_TIMEOUT_IPC_MS",
    "RUST_LOG",
];

/// A lockd instance on an ephemeral loopback port, served from a background
/// runtime for the lifetime of the test.
pub struct TestDaemon {
    port: u16,
    stop: Option<oneshot::Sender<()>>,
    runtime: Option<Runtime>,
}

impl TestDaemon {
    pub fn start() -> Self {
        Self::start_with(Config::new("127.0.0.1", 0))
    }

    pub fn with_force_token(token: &str) -> Self {
        Self::start_with(Config::new("127.0.0.1", 0).with_force_token(token))
    }

    fn start_with(config: Config) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to build runtime");
        let daemon = runtime
            .block_on(startup(&config))
            .expect("Failed to start daemon");
        let port = daemon.local_addr().expect("No local addr").port();

        let (stop, stop_rx) = oneshot::channel::<()>();
        runtime.spawn(async move {
            daemon
                .run(async {
                    let _ = stop_rx.await;
                })
                .await;
        });

        Self {
            port,
            stop: Some(stop),
            runtime: Some(runtime),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `lock` pointed at this daemon with a clean environment.
    pub fn lock(&self) -> Command {
        let mut cmd = Command::cargo_bin("lock").unwrap();
        for var in CLIENT_ENV {
            cmd.env_remove(var);
        }
        cmd.args(["--host", "127.0.0.1", "--port", &self.port.to_string()]);
        cmd
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Pid the `lock` binary reports for itself: its parent, this test process.
pub fn shell_pid() -> i32 {
    std::process::id() as i32
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
