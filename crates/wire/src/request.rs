// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use fq_core::{Action, AgentId, AppId, AppSpec, OperationId, Package, Plugin, QueueEntryId, TagId, Throttle};
use serde::{Deserialize, Serialize};

use super::Query;

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello {
        version: String,
        /// Auth token for TCP connections (ignored for Unix socket)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },

    /// Read-only state query
    Query { query: Query },

    /// Request daemon shutdown
    Shutdown,

    /// Get daemon status
    Status,

    /// Create an operation and fan it out to its targets
    CreateOperation {
        action: Action,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugin: Option<Plugin>,
        #[serde(default)]
        agent_ids: Vec<AgentId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag_id: Option<TagId>,
        created_by: String,
        view_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        throttle: Option<Throttle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        server_ttl_minutes: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent_deadline_ms: Option<u64>,
        #[serde(default)]
        payload: serde_json::Value,
        /// Apps per agent for app-scoped actions
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        apps: BTreeMap<AgentId, Vec<AppSpec>>,
    },

    /// Agent pulls its pending work
    Checkin { agent_id: AgentId },

    /// Agent confirms delivered entries
    Ack { agent_id: AgentId, entry_ids: Vec<QueueEntryId> },

    /// Agent-level result for a simple action
    ReportResult {
        operation_id: OperationId,
        agent_id: AgentId,
        success: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// Result for one application of an app-scoped action
    ReportAppResult {
        operation_id: OperationId,
        agent_id: AgentId,
        app_id: AppId,
        success: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(default)]
        apps_to_add: Vec<Package>,
        #[serde(default)]
        apps_to_delete: Vec<Package>,
        #[serde(default)]
        reboot_required: bool,
    },

    /// Run an expiration sweep now
    Sweep,
}

impl Request {
    /// Whether the request only reads state.
    pub fn is_query(&self) -> bool {
        matches!(self, Request::Ping | Request::Hello { .. } | Request::Query { .. } | Request::Status)
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
