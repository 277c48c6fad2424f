// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock manager: timeout-bounded acquisition and forced release
//!
//! Wraps an injected [`Locker`] with the polling wait protocol the transport
//! calls into. Acquisition retries every [`POLL_INTERVAL`] until it wins the
//! lock, its deadline passes, or the caller's cancellation signal fires.

use crate::entry::{Holder, LockEntry};
use crate::error::LockError;
use crate::registry::{InMemoryLocker, Locker};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delay between acquisition retries while a lock is contended
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a lock request that did not fail outright.
///
/// Only `Acquired` means the caller now holds the lock. The other outcomes
/// are still reported to clients as successful requests, which existing
/// callers depend on; use [`Acquisition::is_held`] to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The caller holds the lock
    Acquired,
    /// Lock was taken and the request had a zero timeout
    AlreadyHeld,
    /// Lock stayed taken until the deadline passed
    TimedOut,
    /// The caller went away while waiting
    Cancelled,
}

impl Acquisition {
    pub fn is_held(&self) -> bool {
        matches!(self, Acquisition::Acquired)
    }
}

impl std::fmt::Display for Acquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Acquisition::Acquired => write!(f, "acquired"),
            Acquisition::AlreadyHeld => write!(f, "already held"),
            Acquisition::TimedOut => write!(f, "timed out"),
            Acquisition::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Coordinates named locks on top of a [`Locker`] backend
pub struct LockManager<L = InMemoryLocker> {
    locker: Arc<L>,
}

impl LockManager<InMemoryLocker> {
    pub fn new() -> Self {
        Self::with_locker(Arc::new(InMemoryLocker::new()))
    }
}

impl Default for LockManager<InMemoryLocker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Locker> LockManager<L> {
    pub fn with_locker(locker: Arc<L>) -> Self {
        Self { locker }
    }

    pub fn locker(&self) -> &Arc<L> {
        &self.locker
    }

    /// Acquire `name` for `(pid, addr)`, waiting up to `timeout_secs` seconds.
    ///
    /// A timeout of zero tries exactly once.
    pub async fn request_lock(
        &self,
        name: &str,
        pid: i32,
        addr: &str,
        timeout_secs: i32,
    ) -> Result<Acquisition, LockError> {
        self.request_lock_until(name, pid, addr, timeout_secs, std::future::pending())
            .await
    }

    /// Like [`request_lock`](Self::request_lock), but stops waiting as soon as
    /// `cancelled` completes.
    pub async fn request_lock_until<C>(
        &self,
        name: &str,
        pid: i32,
        addr: &str,
        timeout_secs: i32,
        cancelled: C,
    ) -> Result<Acquisition, LockError>
    where
        C: Future<Output = ()>,
    {
        let secs = u64::try_from(timeout_secs)
            .map_err(|_| LockError::InvalidTimeout(timeout_secs))?;

        let start = Instant::now();
        let expired = tokio::time::sleep_until(start + Duration::from_secs(secs));
        let mut ticker = tokio::time::interval_at(start + POLL_INTERVAL, POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(expired);
        tokio::pin!(cancelled);
        let holder = Holder::new(pid, addr);

        loop {
            match self.locker.lock(name, pid, addr) {
                Ok(()) => {
                    debug!(lock = name, %holder, "acquired lock");
                    return Ok(Acquisition::Acquired);
                }
                Err(LockError::AlreadyHeld { .. }) => {}
                Err(e) => return Err(e),
            }

            if secs == 0 {
                debug!(lock = name, %holder, "lock already taken");
                return Ok(Acquisition::AlreadyHeld);
            }

            tokio::select! {
                biased;
                () = &mut cancelled => {
                    debug!(lock = name, %holder, "caller went away while waiting");
                    return Ok(Acquisition::Cancelled);
                }
                () = &mut expired => {
                    debug!(lock = name, %holder, timeout_secs, "timeout before acquiring lock");
                    return Ok(Acquisition::TimedOut);
                }
                _ = ticker.tick() => {}
            }
        }
    }

    /// Release `name` if `(pid, addr)` holds it
    pub fn release_lock(&self, name: &str, pid: i32, addr: &str) -> Result<(), LockError> {
        self.locker.unlock(name, pid, addr)?;
        info!(lock = name, pid, addr, "released lock");
        Ok(())
    }

    /// Release `name` regardless of its holder.
    ///
    /// Refused outright when `expected` is empty; otherwise `supplied` must
    /// equal `expected`.
    pub fn force_release_lock(
        &self,
        name: &str,
        supplied: &str,
        expected: &str,
    ) -> Result<(), LockError> {
        if expected.is_empty() {
            warn!(lock = name, "force release refused: no token configured");
            return Err(LockError::ForceReleaseDisabled);
        }
        if !tokens_match(supplied, expected) {
            warn!(lock = name, "force release refused: token mismatch");
            return Err(LockError::InvalidForceToken);
        }

        self.locker.unlock_by_name(name)?;
        info!(lock = name, "force released lock");
        Ok(())
    }

    /// Snapshot of all currently held locks
    pub fn list_locks(&self) -> Vec<LockEntry> {
        self.locker.snapshot()
    }
}

// Digests have a fixed length, so the comparison cost does not depend on how
// much of the supplied token is correct.
fn tokens_match(supplied: &str, expected: &str) -> bool {
    Sha256::digest(supplied.as_bytes()) == Sha256::digest(expected.as_bytes())
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
