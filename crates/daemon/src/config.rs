// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon command-line and environment configuration

use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 50051;

/// lockd - named lock coordination daemon
#[derive(Parser, Debug)]
#[command(name = "lockd", version, about = "Named lock coordination daemon")]
pub struct Args {
    /// The host to listen on
    #[arg(long, env = "LOCKD_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// The port to listen on
    #[arg(long, env = "LOCKD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Secret that allows force release; force release is disabled when empty
    #[arg(long, env = "LOCKD_FORCE_TOKEN", default_value = "", hide_env_values = true)]
    pub force_token: String,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "LOCKD_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enables verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Secret for force release; empty disables it
    pub force_token: String,
    /// Log file, or stderr when unset
    pub log_path: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            force_token: String::new(),
            log_path: None,
            verbose: false,
        }
    }

    pub fn with_force_token(mut self, token: impl Into<String>) -> Self {
        self.force_token = token.into();
        self
    }

    /// Address the listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn force_release_enabled(&self) -> bool {
        !self.force_token.is_empty()
    }

    /// Default log filter directive when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            force_token: args.force_token,
            log_path: args.log_file,
            verbose: args.verbose,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
