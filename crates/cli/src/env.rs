// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment lookups shared with the daemon's resolution order.

use std::path::PathBuf;
use std::time::Duration;

/// FQ_STATE_DIR > XDG_STATE_HOME/fleetq > ~/.local/state/fleetq
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FQ_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("fleetq"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/fleetq"))
}

pub fn ipc_timeout() -> Duration {
    std::env::var("FQ_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Default `created_by` for new operations
pub fn user() -> String {
    std::env::var("USER").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "fq".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
