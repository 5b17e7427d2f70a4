// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic snapshots of the engine tables.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fq_storage::{Snapshot, Store};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Snapshot `store` to `path` every `interval` until cancelled.
///
/// Serialization and the file write run on the blocking pool.
pub async fn run_checkpointer(
    store: Arc<Store>,
    path: PathBuf,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let state = store.to_state();
                let path = path.clone();
                match tokio::task::spawn_blocking(move || Snapshot::new(state).save(&path)).await {
                    Ok(Ok(())) => debug!("checkpoint saved"),
                    Ok(Err(e)) => warn!(error = %e, "checkpoint failed"),
                    Err(e) => warn!(error = %e, "checkpoint task panicked"),
                }
            }
        }
    }
}
