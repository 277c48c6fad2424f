// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced locker wrapper for consistent observability

use crate::entry::LockEntry;
use crate::error::LockError;
use crate::registry::Locker;

/// Wrapper that adds tracing to any Locker
#[derive(Clone, Debug, Default)]
pub struct TracedLocker<L> {
    inner: L,
}

impl<L> TracedLocker<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: Locker> Locker for TracedLocker<L> {
    fn lock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError> {
        let result = self.inner.lock(name, pid, addr);
        match &result {
            Ok(()) => tracing::trace!(lock = name, pid, addr, "locked"),
            Err(e) => tracing::trace!(lock = name, pid, addr, error = %e, "lock refused"),
        }
        result
    }

    fn unlock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError> {
        let span = tracing::debug_span!("locker.unlock", lock = name, pid, addr);
        let _guard = span.enter();

        let result = self.inner.unlock(name, pid, addr);
        match &result {
            Ok(()) => tracing::debug!("unlocked"),
            Err(e) => tracing::warn!(error = %e, "unlock refused"),
        }
        result
    }

    fn unlock_by_name(&self, name: &str) -> Result<(), LockError> {
        let span = tracing::info_span!("locker.unlock_by_name", lock = name);
        let _guard = span.enter();

        let result = self.inner.unlock_by_name(name);
        match &result {
            Ok(()) => tracing::info!("unlocked regardless of holder"),
            Err(e) => tracing::error!(error = %e, "unlock by name failed"),
        }
        result
    }

    fn snapshot(&self) -> Vec<LockEntry> {
        let entries = self.inner.snapshot();
        tracing::trace!(held = entries.len(), "snapshot");
        entries
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
