// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between lock clients and the daemon
//!
//! Every message is a 4-byte big-endian length followed by a JSON body.
//! A connection carries one request and one response.
//!
//! The daemon reads EOF on a connection as the client going away. A client
//! waiting on `Acquire` must keep its write half open until the response
//! arrives; shutting it down abandons the wait and no response is sent.

use std::time::Duration;

use lock_core::LockEntry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Daemon version reported in the hello handshake
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for reading a request or writing a response
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single message body
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Requests from client to daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Liveness check
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Acquire a named lock, waiting up to `timeout_secs`
    Acquire {
        name: String,
        pid: i32,
        timeout_secs: i32,
    },

    /// Release a named lock; a non-empty `force_token` releases regardless of holder
    Release {
        name: String,
        pid: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        force_token: Option<String>,
    },

    /// List held locks
    List,

    /// Daemon status
    Status,
}

/// Responses from daemon to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Hello { version: String },

    /// Result of an acquire request
    Lock { success: bool, message: String },

    /// Result of a release request
    Release { success: bool, message: String },

    Locks { locks: Vec<LockSummary> },

    Status { uptime_secs: u64, locks_held: usize },

    /// The request itself was invalid
    Error { message: String },
}

/// Lock as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSummary {
    pub name: String,
    pub pid: i32,
    pub addr: String,
    pub locked: bool,
}

impl From<LockEntry> for LockSummary {
    fn from(entry: LockEntry) -> Self {
        Self {
            name: entry.name,
            pid: entry.pid,
            addr: entry.addr,
            locked: entry.held,
        }
    }
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Serialize a message to JSON (without length prefix)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserialize a message from JSON
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write a length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-prefixed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            e.into()
        }
    })?;
    Ok(buffer)
}

/// Read and decode a request, bounded by `timeout`
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Encode and write a response, bounded by `timeout`
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
