// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! lock-core: named lock coordination
//!
//! This crate provides:
//! - The `Locker` capability trait and its in-memory registry
//! - `LockManager`, the timeout-bounded acquisition and force-release policy
//! - A tracing wrapper for any locker backend

pub mod entry;
pub mod error;
pub mod manager;
pub mod registry;
pub mod traced;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use entry::{Holder, LockEntry};
pub use error::LockError;
pub use manager::{Acquisition, LockManager, POLL_INTERVAL};
pub use registry::{InMemoryLocker, Locker};
pub use traced::TracedLocker;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLocker, LockerCall};
