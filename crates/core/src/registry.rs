// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock registry: the authoritative table of held locks
//!
//! The registry never waits. Each operation is one critical section over the
//! whole table, so no caller can observe a partially applied update.

use crate::entry::{Holder, LockEntry};
use crate::error::LockError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Storage backend for named locks
///
/// Implementations must make every operation atomic with respect to all the
/// others: two concurrent `lock` calls for the same name may not both succeed.
pub trait Locker: Send + Sync {
    /// Take `name` for `(pid, addr)` if nobody holds it.
    fn lock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError>;

    /// Release `name` if it is held by exactly `(pid, addr)`.
    fn unlock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError>;

    /// Release `name` regardless of the holder. Releasing a free lock is a no-op.
    fn unlock_by_name(&self, name: &str) -> Result<(), LockError>;

    /// Point-in-time copy of every held lock, in no particular order.
    fn snapshot(&self) -> Vec<LockEntry>;
}

/// In-memory lock table guarded by a single mutex
#[derive(Debug, Default)]
pub struct InMemoryLocker {
    locks: Mutex<HashMap<String, Holder>>,
}

impl InMemoryLocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holder of `name`, if any
    pub fn holder(&self, name: &str) -> Option<Holder> {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Locker for InMemoryLocker {
    fn lock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.contains_key(name) {
            return Err(LockError::AlreadyHeld {
                name: name.to_string(),
            });
        }
        locks.insert(name.to_string(), Holder::new(pid, addr));
        Ok(())
    }

    fn unlock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        match locks.get(name) {
            Some(holder) if holder.matches(pid, addr) => {
                locks.remove(name);
                Ok(())
            }
            _ => Err(LockError::NotOwner {
                name: name.to_string(),
            }),
        }
    }

    fn unlock_by_name(&self, name: &str) -> Result<(), LockError> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(name);
        Ok(())
    }

    fn snapshot(&self) -> Vec<LockEntry> {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .iter()
            .map(|(name, holder)| LockEntry::held(name, holder))
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
