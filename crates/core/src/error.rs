// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock errors

use thiserror::Error;

/// Errors returned by the registry and the lock manager.
///
/// Only `InvalidTimeout` is a malformed-input failure; the rest are expected
/// outcomes the transport reports as `success: false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("timeout seconds must be greater than or equal to 0, got {0}")]
    InvalidTimeout(i32),

    #[error("lock {name} already exists")]
    AlreadyHeld { name: String },

    #[error("lock {name} not held by given pid and address or does not exist")]
    NotOwner { name: String },

    #[error("force release is disabled on this server")]
    ForceReleaseDisabled,

    #[error("invalid force token")]
    InvalidForceToken,
}
