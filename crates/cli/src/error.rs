// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use std::fmt;

use lock_daemon::ClientError;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {}

/// Common error builders for typical failure scenarios.
impl CliError {
    /// The daemon could not be reached at all.
    pub fn daemon_unreachable(addr: &str) -> Self {
        CliError::new(format!("Cannot reach lockd at {}", addr))
            .with_context("Nothing is accepting connections on that address")
            .with_suggestion(format!("Start the daemon: lockd --port {}", port_of(addr)))
            .with_suggestion("Point the client elsewhere with --host/--port or LOCK_HOST/LOCK_PORT")
    }

    /// The daemon answered but did not grant the lock.
    pub fn lock_not_acquired(name: &str, message: &str) -> Self {
        CliError::new(format!("Failed to acquire lock '{}'", name))
            .with_context(message.to_string())
            .with_suggestion("Wait longer with --timeout <SECS>")
            .with_suggestion("See who holds it: lock list")
    }

    /// The daemon refused to release the lock.
    pub fn lock_not_released(name: &str, message: &str) -> Self {
        CliError::new(format!("Failed to release lock '{}'", name))
            .with_context(message.to_string())
            .with_suggestion("Release from the shell that acquired it")
            .with_suggestion(format!(
                "Force release with: lock --lock {} force-release --force-token <TOKEN>",
                name
            ))
    }

    /// Force release needs a token before anything is sent.
    pub fn force_token_required() -> Self {
        CliError::new("force token is required")
            .with_suggestion("Pass --force-token <TOKEN> or set LOCK_FORCE_TOKEN")
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::DaemonNotRunning(addr) => CliError::daemon_unreachable(&addr),
            ClientError::Rejected(message) => CliError::new(message),
            ClientError::ForceTokenRequired => CliError::force_token_required(),
            other => CliError::new(other.to_string()),
        }
    }
}

fn port_of(addr: &str) -> &str {
    addr.rsplit_once(':').map_or(addr, |(_, port)| port)
}
