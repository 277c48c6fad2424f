// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for talking to a running lockd
//!
//! ```no_run
//! # async fn demo() -> Result<(), lock_daemon::client::ClientError> {
//! use lock_daemon::client::{caller_pid, DaemonClient};
//!
//! let client = DaemonClient::default().with_host("locks.internal");
//! let pid = caller_pid()?;
//! client.acquire("deploy", pid, 30).await?.into_result()?;
//! // ... critical section ...
//! client.release("deploy", pid, None).await?.into_result()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;

use crate::config::DEFAULT_PORT;
use crate::protocol::{self, LockSummary, ProtocolError, Request, Response};

/// Host a client connects to unless told otherwise
pub const DEFAULT_CLIENT_HOST: &str = "127.0.0.1";

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests (connect, write, and reading non-waiting replies)
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("LOCK_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Read timeout for an acquire that may wait `timeout_secs` on the server
pub fn timeout_acquire(timeout_secs: i32) -> Duration {
    let wait = u64::try_from(timeout_secs).unwrap_or(0);
    timeout_ipc() + Duration::from_secs(wait)
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running at {0}")]
    DaemonNotRunning(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The daemon answered with `success: false`
    #[error("{0}")]
    Refused(String),

    #[error("force token is required")]
    ForceTokenRequired,

    #[error("pid {0} does not fit the protocol's signed 32-bit pid")]
    PidOutOfRange(u32),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of an acquire or release as reported by the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub success: bool,
    pub message: String,
}

impl Reply {
    /// The daemon's message on success, [`ClientError::Refused`] otherwise
    pub fn into_result(self) -> Result<String, ClientError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(ClientError::Refused(self.message))
        }
    }
}

/// Daemon status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub uptime_secs: u64,
    pub locks_held: usize,
}

/// Daemon client. Each call opens its own connection.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    host: String,
    port: u16,
}

impl Default for DaemonClient {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_HOST, DEFAULT_PORT)
    }
}

impl DaemonClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let addr = self.addr();
        let stream = tokio::time::timeout(write_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ProtocolError::Timeout)?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    ClientError::DaemonNotRunning(addr.clone())
                }
                _ => ClientError::Io(e),
            })?;
        // Both halves stay alive until the response is read: the daemon takes
        // a write shutdown as the client going away.
        let (mut reader, mut writer) = stream.into_split();

        // Encode and send request with write timeout
        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        // Read response with read timeout
        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    /// Request a lock, letting the daemon wait up to `timeout_secs`
    pub async fn acquire(
        &self,
        name: &str,
        pid: i32,
        timeout_secs: i32,
    ) -> Result<Reply, ClientError> {
        let request = Request::Acquire {
            name: name.to_string(),
            pid,
            timeout_secs,
        };
        match self
            .send_with_timeout(request, timeout_acquire(timeout_secs), timeout_ipc())
            .await?
        {
            Response::Lock { success, message } => Ok(Reply { success, message }),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Release a lock held by `pid`, or any holder when `force_token` is given
    pub async fn release(
        &self,
        name: &str,
        pid: i32,
        force_token: Option<&str>,
    ) -> Result<Reply, ClientError> {
        match self
            .send(Request::Release {
                name: name.to_string(),
                pid,
                force_token: force_token.map(str::to_string),
            })
            .await?
        {
            Response::Release { success, message } => Ok(Reply { success, message }),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Release a lock whoever holds it. An empty token is refused locally.
    pub async fn force_release(
        &self,
        name: &str,
        pid: i32,
        force_token: &str,
    ) -> Result<Reply, ClientError> {
        if force_token.is_empty() {
            return Err(ClientError::ForceTokenRequired);
        }
        self.release(name, pid, Some(force_token)).await
    }

    /// List held locks
    pub async fn list(&self) -> Result<Vec<LockSummary>, ClientError> {
        match self.send(Request::List).await? {
            Response::Locks { locks } => Ok(locks),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<Status, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                locks_held,
            } => Ok(Status {
                uptime_secs,
                locks_held,
            }),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .send(Request::Hello {
                version: protocol::PROTOCOL_VERSION.to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

/// Pid that identifies this caller: the process that started it, usually
/// the invoking shell
pub fn caller_pid() -> Result<i32, ClientError> {
    wire_pid(std::os::unix::process::parent_id())
}

fn wire_pid(raw: u32) -> Result<i32, ClientError> {
    i32::try_from(raw).map_err(|_| ClientError::PidOutOfRange(raw))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
