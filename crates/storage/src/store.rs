// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four persisted tables and their secondary lookups.

use fq_core::{
    AgentId, AppId, Operation, OperationId, OperationPerAgent, OperationPerApp,
};
use serde::{Deserialize, Serialize};

use crate::queue::{QueueState, QueueStore};
use crate::table::Table;

pub type AgentKey = (OperationId, AgentId);
pub type AppKey = (OperationId, AgentId, AppId);

/// Serializable contents of a [`Store`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub agents: Vec<OperationPerAgent>,
    #[serde(default)]
    pub apps: Vec<OperationPerApp>,
    #[serde(default)]
    pub queue: QueueState,
}

/// Ledger, tracker, and queue tables.
#[derive(Debug, Default)]
pub struct Store {
    pub operations: Table<OperationId, Operation>,
    pub agents: Table<AgentKey, OperationPerAgent>,
    pub apps: Table<AppKey, OperationPerApp>,
    pub queue: QueueStore,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            operations: Table::from_rows(state.operations.into_iter().map(|op| (op.id.clone(), op))),
            agents: Table::from_rows(state.agents.into_iter().map(|t| (agent_key(&t), t))),
            apps: Table::from_rows(state.apps.into_iter().map(|a| (app_key(&a), a))),
            queue: QueueStore::from_state(state.queue),
        }
    }

    pub fn to_state(&self) -> StoreState {
        StoreState {
            operations: self.operations.values(),
            agents: self.agents.values(),
            apps: self.apps.values(),
            queue: self.queue.to_state(),
        }
    }

    /// Tracker rows of one operation, ordered by agent id.
    pub fn agents_of(&self, operation_id: &OperationId) -> Vec<OperationPerAgent> {
        let from = (operation_id.clone(), AgentId::new(""));
        self.agents.range_while(&from, |(op, _)| op == operation_id)
    }

    /// App rows of one (operation, agent), ordered by app id.
    pub fn apps_of(&self, operation_id: &OperationId, agent_id: &AgentId) -> Vec<OperationPerApp> {
        let from = (operation_id.clone(), agent_id.clone(), AppId::new(""));
        self.apps.range_while(&from, |(op, agent, _)| op == operation_id && agent == agent_id)
    }
}

pub fn agent_key(row: &OperationPerAgent) -> AgentKey {
    (row.operation_id.clone(), row.agent_id.clone())
}

pub fn app_key(row: &OperationPerApp) -> AppKey {
    (row.operation_id.clone(), row.agent_id.clone(), row.app_id.clone())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
