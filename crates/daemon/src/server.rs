// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use lock_core::{Acquisition, InMemoryLocker, LockError, LockManager, TracedLocker};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tracing::{debug, error};

use crate::protocol::{self, LockSummary, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Lock manager with the daemon's concrete backend (wrapped with tracing)
pub type DaemonManager = LockManager<TracedLocker<InMemoryLocker>>;

/// State shared by every connection
pub struct ServerContext {
    pub manager: DaemonManager,
    /// Secret required for force release; empty disables it
    pub force_token: String,
    pub start_time: Instant,
}

impl ServerContext {
    pub fn new(manager: DaemonManager, force_token: impl Into<String>) -> Self {
        Self {
            manager,
            force_token: force_token.into(),
            start_time: Instant::now(),
        }
    }
}

/// Handle a single client connection
pub async fn handle_connection(
    ctx: &ServerContext,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            let response = Response::Error {
                message: e.to_string(),
            };
            let _ = protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await;
            return Err(ServerError::Protocol(e));
        }
    };

    let addr = caller_addr(&peer);
    debug!(%addr, "Received request: {:?}", request);

    let Some(response) = handle_request(ctx, request, &addr, disconnected(&mut reader)).await
    else {
        debug!(%addr, "Client went away, dropping response");
        return Ok(());
    };

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request from `addr` and return a response.
///
/// Returns `None` when the caller disconnected while waiting for a lock.
pub async fn handle_request<C>(
    ctx: &ServerContext,
    request: Request,
    addr: &str,
    disconnected: C,
) -> Option<Response>
where
    C: Future<Output = ()>,
{
    let response = match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Acquire {
            name,
            pid,
            timeout_secs,
        } => {
            match ctx
                .manager
                .request_lock_until(&name, pid, addr, timeout_secs, disconnected)
                .await
            {
                Ok(Acquisition::Cancelled) => return None,
                Ok(outcome) => acquire_response(outcome),
                Err(e @ LockError::InvalidTimeout(_)) => Response::Error {
                    message: e.to_string(),
                },
                Err(e) => Response::Lock {
                    success: false,
                    message: e.to_string(),
                },
            }
        }

        Request::Release {
            name,
            pid,
            force_token,
        } => {
            let result = match force_token.as_deref() {
                Some(token) if !token.is_empty() => {
                    ctx.manager
                        .force_release_lock(&name, token, &ctx.force_token)
                }
                _ => ctx.manager.release_lock(&name, pid, addr),
            };
            match result {
                Ok(()) => Response::Release {
                    success: true,
                    message: "Lock released".to_string(),
                },
                Err(e) => Response::Release {
                    success: false,
                    message: e.to_string(),
                },
            }
        }

        Request::List => {
            let mut locks: Vec<LockSummary> = ctx
                .manager
                .list_locks()
                .into_iter()
                .map(LockSummary::from)
                .collect();
            locks.sort_by(|a, b| a.name.cmp(&b.name));
            Response::Locks { locks }
        }

        Request::Status => Response::Status {
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            locks_held: ctx.manager.list_locks().len(),
        },
    };

    Some(response)
}

// Outcomes other than `Acquired` stay `success: true` for existing clients;
// only the message tells them apart.
fn acquire_response(outcome: Acquisition) -> Response {
    let message = if outcome.is_held() {
        "Lock acquired".to_string()
    } else {
        format!("Lock not acquired: {}", outcome)
    };
    Response::Lock {
        success: true,
        message,
    }
}

/// Caller identity as seen on the network: the peer IP without its port
pub fn caller_addr(peer: &SocketAddr) -> String {
    peer.ip().to_canonical().to_string()
}

/// Completes once the peer closes its side of the connection.
///
/// A write shutdown from the peer also ends the wait; see the protocol docs.
async fn disconnected<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 64];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
