// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lock-daemon: TCP transport for the lock manager
//!
//! Shared by the `lockd` binary and by clients that speak its protocol.
//! [`DaemonClient`] is the library entry point for programs that take locks.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use client::{ClientError, DaemonClient, Reply};
pub use config::{Args, Config};
pub use lifecycle::{startup, DaemonState, LifecycleError};
pub use protocol::{LockSummary, ProtocolError, Request, Response};
pub use server::{ServerContext, ServerError};
