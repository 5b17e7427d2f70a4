// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent pull-queue entries and their two-level TTLs.

use serde::{Deserialize, Serialize};

use crate::action::{Action, Plugin, RequestMethod};
use crate::clock::minutes_to_ms;
use crate::id::{AgentId, OperationId, QueueEntryId};

/// Server and agent deadlines for one queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTtl {
    /// After this the server treats the entry as abandoned
    pub server_queue_ttl_ms: u64,
    /// Deadline handed to the agent; never earlier than the server deadline
    pub agent_queue_ttl_ms: u64,
    pub expire_minutes: u64,
}

impl QueueTtl {
    /// Compute deadlines from `now`.
    ///
    /// The agent deadline is `now + server + agent` minutes unless an explicit
    /// deadline later than the server deadline was supplied.
    pub fn compute(
        now_ms: u64,
        server_minutes: u64,
        agent_minutes: u64,
        agent_deadline_ms: Option<u64>,
    ) -> Self {
        let server_queue_ttl_ms = now_ms.saturating_add(minutes_to_ms(server_minutes));
        let agent_queue_ttl_ms = match agent_deadline_ms {
            Some(deadline) if deadline > server_queue_ttl_ms => deadline,
            _ => server_queue_ttl_ms.saturating_add(minutes_to_ms(agent_minutes)),
        };
        Self { server_queue_ttl_ms, agent_queue_ttl_ms, expire_minutes: server_minutes }
    }
}

/// One pending instruction in an agent's pull queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: QueueEntryId,
    pub agent_id: AgentId,
    pub view_name: String,
    /// Assigned by the store on enqueue
    #[serde(default)]
    pub order_id: u64,
    pub operation_id: OperationId,
    pub action: Action,
    pub plugin: Plugin,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub request_method: RequestMethod,
    pub response_uri: String,
    pub created_at_ms: u64,
    #[serde(flatten)]
    pub ttl: QueueTtl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leased_until_ms: Option<u64>,
}

impl QueueEntry {
    /// Build an entry for `agent_id` with its result callback derived from the action.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        agent_id: AgentId,
        view_name: impl Into<String>,
        operation_id: OperationId,
        action: Action,
        plugin: Plugin,
        payload: serde_json::Value,
        ttl: QueueTtl,
        now_ms: u64,
    ) -> Self {
        let (request_method, response_uri) = action.result_callback(&agent_id);
        Self {
            id: QueueEntryId::new(),
            agent_id,
            view_name: view_name.into(),
            order_id: 0,
            operation_id,
            action,
            plugin,
            payload,
            request_method,
            response_uri,
            created_at_ms: now_ms,
            ttl,
            leased_until_ms: None,
        }
    }

    /// Server deadline has passed.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.ttl.server_queue_ttl_ms <= now_ms
    }

    /// Delivered and still within its visibility window.
    pub fn is_leased(&self, now_ms: u64) -> bool {
        self.leased_until_ms.is_some_and(|until| until > now_ms)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
