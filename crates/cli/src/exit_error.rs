// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use crate::client::ClientError;

/// Daemon refused the request as invalid
pub const EXIT_REJECTED: i32 = 2;
/// Daemon is not running
pub const EXIT_NOT_RUNNING: i32 = 3;
/// Transient failure; the same command may succeed if retried
pub const EXIT_RETRYABLE: i32 = 75;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<ClientError> for ExitError {
    fn from(e: ClientError) -> Self {
        let code = match &e {
            ClientError::DaemonNotRunning => EXIT_NOT_RUNNING,
            ClientError::Rejected { retryable: true, .. } => EXIT_RETRYABLE,
            ClientError::Rejected { .. } => EXIT_REJECTED,
            _ => 1,
        };
        Self::new(code, e.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
