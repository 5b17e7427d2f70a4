// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiration sweeper.
//!
//! Entries past their server deadline are removed from the queue and their
//! trackers expired. At most one sweep runs at a time; a trigger that lands
//! while one is in progress is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fq_adapters::{InventoryAdapter, TargetDirectory, ViewSettings};
use fq_core::{AppResults, Clock, Plugin, QueueEntry};
use fq_storage::WriteOutcome;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::ledger;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries found past their deadline
    pub examined: usize,
    /// Trackers moved to expired
    pub expired: usize,
}

/// Clears the in-progress flag when the sweep ends, even if it is dropped.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<D, V, I, C> Engine<D, V, I, C>
where
    D: TargetDirectory,
    V: ViewSettings,
    I: InventoryAdapter,
    C: Clock,
{
    /// Expire everything past its server deadline.
    ///
    /// Returns `None` when another sweep is already running.
    pub async fn sweep(&self) -> Option<SweepReport> {
        if self.sweeping.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            debug!("sweep already running, skipping");
            return None;
        }
        let _guard = SweepGuard(&self.sweeping);

        let now = self.clock.epoch_ms();
        let entries = self.store.queue.expired(now);
        let mut report = SweepReport { examined: entries.len(), ..SweepReport::default() };
        for entry in &entries {
            if self.expire_entry(entry, now).await {
                report.expired += 1;
            }
        }

        if report.examined > 0 {
            info!(examined = report.examined, expired = report.expired, "sweep");
        }
        Some(report)
    }

    /// Remove an expired entry and expire its tracker. Returns whether the
    /// tracker transitioned.
    pub(crate) async fn expire_entry(&self, entry: &QueueEntry, now: u64) -> bool {
        let QueueEntry { operation_id, agent_id, .. } = entry;
        self.store.queue.remove(&entry.id);

        let key = (operation_id.clone(), agent_id.clone());
        let rollup = match self.store.agents.update(&key, |t| t.expire(now)) {
            WriteOutcome::Replaced(rollup) => rollup,
            WriteOutcome::Unchanged => {
                debug!(%operation_id, %agent_id, "entry expired after tracker finished");
                return false;
            }
            WriteOutcome::Absent => {
                warn!(%operation_id, %agent_id, "expired entry without tracker");
                return false;
            }
        };
        info!(%operation_id, %agent_id, deadline = entry.ttl.server_queue_ttl_ms, "operation expired");
        if let Err(e) = ledger::apply_rollup(&self.store, operation_id, rollup, now) {
            warn!(%operation_id, %agent_id, error = %e, "expiry rollup failed");
        }

        if entry.plugin == Plugin::Patching {
            let pending = self
                .store
                .apps_of(operation_id, agent_id)
                .into_iter()
                .filter(|app| app.results == AppResults::Pending);
            for app in pending {
                if let Err(e) = self.inventory.revert_app(agent_id, &app.app_id, entry.action).await {
                    warn!(%operation_id, %agent_id, app_id = %app.app_id, error = %e, "failed to revert app");
                }
            }
        }
        true
    }
}

/// Sweep on a fixed interval until cancelled.
pub async fn run_sweeper<D, V, I, C>(
    engine: Arc<Engine<D, V, I, C>>,
    interval: Duration,
    cancel: CancellationToken,
) where
    D: TargetDirectory,
    V: ViewSettings,
    I: InventoryAdapter,
    C: Clock,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!(interval_ms = interval.as_millis() as u64, "sweeper started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                engine.sweep().await;
            }
        }
    }
    info!("sweeper stopped");
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;
