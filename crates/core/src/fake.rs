// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake locker for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::entry::LockEntry;
use crate::error::LockError;
use crate::registry::{InMemoryLocker, Locker};
use std::sync::{Arc, Mutex};

/// Recorded locker call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockerCall {
    Lock { name: String, pid: i32, addr: String },
    Unlock { name: String, pid: i32, addr: String },
    UnlockByName { name: String },
    Snapshot,
}

/// In-memory locker that records every call made against it
#[derive(Clone, Default)]
pub struct FakeLocker {
    inner: Arc<InMemoryLocker>,
    calls: Arc<Mutex<Vec<LockerCall>>>,
}

impl FakeLocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LockerCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of `lock` attempts made for `name`
    pub fn lock_attempts(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| matches!(c, LockerCall::Lock { name: n, .. } if n == name))
            .count()
    }

    /// Direct access to the backing table, bypassing call recording
    pub fn table(&self) -> &InMemoryLocker {
        &self.inner
    }

    fn record(&self, call: LockerCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl Locker for FakeLocker {
    fn lock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError> {
        self.record(LockerCall::Lock {
            name: name.to_string(),
            pid,
            addr: addr.to_string(),
        });
        self.inner.lock(name, pid, addr)
    }

    fn unlock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError> {
        self.record(LockerCall::Unlock {
            name: name.to_string(),
            pid,
            addr: addr.to_string(),
        });
        self.inner.unlock(name, pid, addr)
    }

    fn unlock_by_name(&self, name: &str) -> Result<(), LockError> {
        self.record(LockerCall::UnlockByName {
            name: name.to_string(),
        });
        self.inner.unlock_by_name(name)
    }

    fn snapshot(&self) -> Vec<LockEntry> {
        self.record(LockerCall::Snapshot);
        self.inner.snapshot()
    }
}
