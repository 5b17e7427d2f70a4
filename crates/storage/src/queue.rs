// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent pull queues.
//!
//! Entries are indexed by agent (ordered by `order_id`), by id, and by
//! server deadline for the sweeper. Order ids come from a per-agent
//! high-water mark that survives the queue draining, so they are never
//! reused.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use fq_core::{AgentId, OperationId, QueueEntry, QueueEntryId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Serializable contents of a [`QueueStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueState {
    pub entries: Vec<QueueEntry>,
    #[serde(default)]
    pub high_water: BTreeMap<AgentId, u64>,
}

#[derive(Debug, Default)]
struct Inner {
    by_agent: HashMap<AgentId, BTreeMap<u64, QueueEntry>>,
    by_id: HashMap<QueueEntryId, (AgentId, u64)>,
    by_deadline: BTreeSet<(u64, QueueEntryId)>,
    high_water: BTreeMap<AgentId, u64>,
}

impl Inner {
    fn insert(&mut self, entry: QueueEntry) {
        self.by_id.insert(entry.id.clone(), (entry.agent_id.clone(), entry.order_id));
        self.by_deadline.insert((entry.ttl.server_queue_ttl_ms, entry.id.clone()));
        self.by_agent.entry(entry.agent_id.clone()).or_default().insert(entry.order_id, entry);
    }

    fn remove(&mut self, id: &QueueEntryId) -> Option<QueueEntry> {
        let (agent_id, order_id) = self.by_id.remove(id)?;
        let queue = self.by_agent.get_mut(&agent_id)?;
        let entry = queue.remove(&order_id)?;
        if queue.is_empty() {
            self.by_agent.remove(&agent_id);
        }
        self.by_deadline.remove(&(entry.ttl.server_queue_ttl_ms, entry.id.clone()));
        Some(entry)
    }

    fn remove_where(
        &mut self,
        agent_id: &AgentId,
        pred: impl Fn(&QueueEntry) -> bool,
    ) -> Vec<QueueEntry> {
        let ids: Vec<QueueEntryId> = self
            .by_agent
            .get(agent_id)
            .map(|q| q.values().filter(|e| pred(e)).map(|e| e.id.clone()).collect())
            .unwrap_or_default();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }
}

/// All agents' pull queues behind one lock.
#[derive(Debug, Default)]
pub struct QueueStore {
    inner: Mutex<Inner>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: QueueState) -> Self {
        let mut inner = Inner { high_water: state.high_water, ..Inner::default() };
        for entry in state.entries {
            let mark = inner.high_water.entry(entry.agent_id.clone()).or_default();
            *mark = (*mark).max(entry.order_id);
            inner.insert(entry);
        }
        Self { inner: Mutex::new(inner) }
    }

    pub fn to_state(&self) -> QueueState {
        let inner = self.inner.lock();
        let mut entries: Vec<QueueEntry> =
            inner.by_agent.values().flat_map(|q| q.values().cloned()).collect();
        entries.sort_by(|a, b| (&a.agent_id, a.order_id).cmp(&(&b.agent_id, b.order_id)));
        QueueState { entries, high_water: inner.high_water.clone() }
    }

    /// Append an entry to its agent's queue and return the assigned order id.
    pub fn enqueue(&self, mut entry: QueueEntry) -> u64 {
        let mut inner = self.inner.lock();
        let mark = inner.high_water.entry(entry.agent_id.clone()).or_default();
        *mark += 1;
        entry.order_id = *mark;
        let order_id = entry.order_id;
        inner.insert(entry);
        order_id
    }

    /// Fetch and remove every entry for the agent in one step.
    pub fn pop_all(&self, agent_id: &AgentId) -> Vec<QueueEntry> {
        self.inner.lock().remove_where(agent_id, |_| true)
    }

    /// Deliver every entry not currently leased and hide it until `now + visibility_ms`.
    ///
    /// Entries stay queued until acknowledged, resolved by a result, or swept.
    pub fn lease_all(&self, agent_id: &AgentId, now_ms: u64, visibility_ms: u64) -> Vec<QueueEntry> {
        let mut inner = self.inner.lock();
        let Some(queue) = inner.by_agent.get_mut(agent_id) else {
            return Vec::new();
        };
        let until = now_ms.saturating_add(visibility_ms);
        queue
            .values_mut()
            .filter(|e| !e.is_leased(now_ms))
            .map(|e| {
                e.leased_until_ms = Some(until);
                e.clone()
            })
            .collect()
    }

    /// Remove delivered entries the agent confirms. Ids owned by other agents are ignored.
    pub fn ack(&self, agent_id: &AgentId, ids: &[QueueEntryId]) -> Vec<QueueEntry> {
        self.inner.lock().remove_where(agent_id, |e| ids.contains(&e.id))
    }

    /// Remove the agent's entries for one operation.
    pub fn remove_for_operation(
        &self,
        agent_id: &AgentId,
        operation_id: &OperationId,
    ) -> Vec<QueueEntry> {
        self.inner.lock().remove_where(agent_id, |e| e.operation_id == *operation_id)
    }

    /// Idempotent delete by id.
    pub fn remove(&self, id: &QueueEntryId) -> Option<QueueEntry> {
        self.inner.lock().remove(id)
    }

    /// Entries whose server deadline is at or before `now_ms`, earliest first.
    pub fn expired(&self, now_ms: u64) -> Vec<QueueEntry> {
        let inner = self.inner.lock();
        inner
            .by_deadline
            .iter()
            .take_while(|(deadline, _)| *deadline <= now_ms)
            .filter_map(|(_, id)| {
                let (agent_id, order_id) = inner.by_id.get(id)?;
                inner.by_agent.get(agent_id)?.get(order_id).cloned()
            })
            .collect()
    }

    /// The agent's queue in order, without side effects.
    pub fn list(&self, agent_id: &AgentId) -> Vec<QueueEntry> {
        self.inner
            .lock()
            .by_agent
            .get(agent_id)
            .map(|q| q.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
