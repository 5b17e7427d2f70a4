// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, checkpoints, shutdown.

mod checkpoint;
mod startup;
pub use checkpoint::run_checkpointer;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fq_adapters::{StaticDirectory, StaticViews, TracingInventory};
use fq_core::SystemClock;
use fq_engine::Engine;
use fq_storage::Snapshot;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::{ConfigError, Settings};

/// Engine with the daemon's concrete collaborators
pub type DaemonEngine = Engine<StaticDirectory, StaticViews, TracingInventory, SystemClock>;

/// Daemon paths
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/fleetq)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to snapshot file
    pub snapshot_path: PathBuf,
    /// Path to optional settings file
    pub config_path: PathBuf,
}

impl Config {
    /// Load paths for the user-level daemon.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_state_dir(crate::env::state_dir()?))
    }

    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            snapshot_path: state_dir.join("snapshot.zst"),
            config_path: state_dir.join("config.toml"),
            state_dir,
        }
    }
}

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a task.
pub struct DaemonState {
    pub config: Config,
    pub settings: Settings,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Shared with the listener, sweeper, and checkpointer
    pub engine: Arc<DaemonEngine>,
    pub start_time: Instant,
}

/// Result of daemon startup
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
}

impl DaemonState {
    /// Write the current tables to the snapshot file.
    pub fn checkpoint(&self) -> Result<(), LifecycleError> {
        Snapshot::new(self.engine.store().to_state()).save(&self.config.snapshot_path)?;
        Ok(())
    }

    /// Shutdown the daemon gracefully.
    ///
    /// Saves a final snapshot, then removes the socket, PID, and version
    /// files. The lock is released when `self` is dropped.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        if let Err(e) = self.checkpoint() {
            warn!("Failed to save shutdown snapshot: {}", e);
        }

        for path in [&self.config.socket_path, &self.config.lock_path, &self.config.version_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), "Failed to remove file: {}", e);
                }
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Failed to bind TCP port {0}: {1}")]
    TcpBindFailed(u16, std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] fq_storage::SnapshotError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
