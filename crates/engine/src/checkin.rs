// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent check-in: deliver queued work and mark it picked up.

use fq_adapters::{InventoryAdapter, TargetDirectory, ViewSettings};
use fq_core::{AgentId, Clock, QueueEntry, QueueEntryId};
use fq_storage::WriteOutcome;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::ledger;

impl<D, V, I, C> Engine<D, V, I, C>
where
    D: TargetDirectory,
    V: ViewSettings,
    I: InventoryAdapter,
    C: Clock,
{
    /// Deliver the agent's pending entries in order.
    ///
    /// With a visibility timeout the entries stay queued, hidden, until
    /// acknowledged or resolved by a result; otherwise they are removed on
    /// delivery. Entries already past their server deadline are expired
    /// instead of delivered.
    pub async fn checkin(&self, agent_id: &AgentId) -> Result<Vec<QueueEntry>, EngineError> {
        if !self.directory.is_enabled(agent_id).await? {
            warn!(%agent_id, "check-in from disabled agent");
            return Err(EngineError::AgentDisabled(agent_id.clone()));
        }

        let now = self.clock.epoch_ms();
        let visibility = self.config.visibility_timeout_ms;
        let entries = if visibility == 0 {
            self.store.queue.pop_all(agent_id)
        } else {
            self.store.queue.lease_all(agent_id, now, visibility)
        };

        let mut delivered = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.is_expired(now) {
                self.expire_entry(&entry, now).await;
                continue;
            }
            self.pick_up(&entry, now);
            delivered.push(entry);
        }

        if delivered.is_empty() {
            debug!(%agent_id, "check-in, nothing queued");
        } else {
            info!(%agent_id, delivered = delivered.len(), "check-in");
        }
        Ok(delivered)
    }

    /// Remove delivered entries the agent confirms receiving.
    pub fn ack(&self, agent_id: &AgentId, entry_ids: &[QueueEntryId]) -> usize {
        let removed = self.store.queue.ack(agent_id, entry_ids).len();
        debug!(%agent_id, requested = entry_ids.len(), removed, "ack");
        removed
    }

    fn pick_up(&self, entry: &QueueEntry, now: u64) {
        let key = (entry.operation_id.clone(), entry.agent_id.clone());
        match self.store.agents.update(&key, |t| t.pick_up(now)) {
            WriteOutcome::Replaced(rollup) => {
                if let Err(e) = ledger::apply_rollup(&self.store, &entry.operation_id, rollup, now) {
                    warn!(operation_id = %entry.operation_id, agent_id = %entry.agent_id, error = %e, "pickup rollup failed");
                }
            }
            WriteOutcome::Unchanged => {}
            WriteOutcome::Absent => {
                warn!(operation_id = %entry.operation_id, agent_id = %entry.agent_id, "queue entry without tracker");
            }
        }
    }
}

#[cfg(test)]
#[path = "checkin_tests.rs"]
mod tests;
