// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fq_adapters::TracingInventory;
use fq_core::SystemClock;
use fq_engine::{Engine, EngineDeps};
use fq_storage::{load_snapshot, Store};
use fs2::FileExt;
use tokio::net::UnixListener;
use tracing::info;

use super::{Config, DaemonState, LifecycleError, StartupResult};
use crate::config::Settings;

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock;
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory (needed for socket, lock, etc.)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races.
    // Open without truncating so a running daemon's PID survives a failed attempt.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, fq_wire::PROTOCOL_VERSION)?;

    // 3. Settings and collaborators
    let settings = Settings::load(&config.config_path)?;

    // 4. Load tables from snapshot (if exists)
    let store = match load_snapshot(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(
                created_at = %snapshot.created_at,
                operations = snapshot.state.operations.len(),
                queued = snapshot.state.queue.entries.len(),
                "Loaded snapshot"
            );
            Store::from_state(snapshot.state)
        }
        None => {
            info!("No snapshot found, starting with empty state");
            Store::new()
        }
    };

    let engine = Arc::new(Engine::new(
        EngineDeps {
            directory: settings.directory(),
            views: settings.views(),
            inventory: TracingInventory,
            store: Arc::new(store),
        },
        SystemClock,
        settings.engine_config(),
    ));

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(
        tags = settings.tags.len(),
        views = settings.views.len(),
        disabled_agents = settings.disabled_agents.len(),
        "Daemon started"
    );

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            settings,
            lock_file,
            engine,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [&config.socket_path, &config.version_path, &config.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
