// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: FQ_STATE_DIR > XDG_STATE_HOME/fleetq > ~/.local/state/fleetq
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("FQ_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fleetq"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/fleetq"))
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("FQ_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// TCP port for remote agents. When set, the daemon listens on this port
/// in addition to the Unix socket.
pub fn tcp_port() -> Option<u16> {
    std::env::var("FQ_TCP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// Auth token for TCP connections, validated in the Hello handshake.
pub fn auth_token() -> Option<String> {
    std::env::var("FQ_AUTH_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Sweep interval override, taking precedence over `[queue]` in config.toml
pub fn sweep_interval() -> Option<Duration> {
    std::env::var("FQ_SWEEP_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
