// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock holder identity and registry entries

/// The caller that owns a held lock.
///
/// `pid` is declared by the caller and never verified; `addr` is the network
/// origin the transport observed. Ownership checks compare both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Holder {
    pub pid: i32,
    pub addr: String,
}

impl Holder {
    pub fn new(pid: i32, addr: impl Into<String>) -> Self {
        Self {
            pid,
            addr: addr.into(),
        }
    }

    pub fn matches(&self, pid: i32, addr: &str) -> bool {
        self.pid == pid && self.addr == addr
    }
}

/// Renders as `addr-pid`, the form used in lock logs
impl std::fmt::Display for Holder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.addr, self.pid)
    }
}

/// A currently held lock, as returned by a snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockEntry {
    pub name: String,
    pub pid: i32,
    pub addr: String,
    /// Always true: free locks are never materialized
    pub held: bool,
}

impl LockEntry {
    pub(crate) fn held(name: &str, holder: &Holder) -> Self {
        Self {
            name: name.to_string(),
            pid: holder.pid,
            addr: holder.addr.clone(),
            held: true,
        }
    }

    pub fn holder(&self) -> Holder {
        Holder::new(self.pid, self.addr.clone())
    }
}
