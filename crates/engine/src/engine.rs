// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine that owns the tables and the collaborators

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use fq_adapters::{InventoryAdapter, TargetDirectory, ViewSettings};
use fq_core::{
    AgentId, AppId, Clock, Operation, OperationFilter, OperationId, OperationPerAgent,
    OperationPerApp, QueueEntry,
};
use fq_storage::Store;
use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;

/// Engine tuning
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// How long delivered entries stay hidden awaiting ack; 0 removes on delivery
    pub visibility_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { visibility_timeout_ms: 60_000 }
    }
}

/// Engine collaborator dependencies
pub struct EngineDeps<D, V, I> {
    pub directory: D,
    pub views: V,
    pub inventory: I,
    pub store: Arc<Store>,
}

/// An operation with every tracker row beneath it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDetail {
    pub operation: Operation,
    pub agents: Vec<OperationPerAgent>,
    pub apps: Vec<OperationPerApp>,
}

/// A page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationPage {
    /// Rows that passed the filter, before paging
    pub total: usize,
    pub operations: Vec<Operation>,
}

/// Dispatch, check-in, result, and expiry logic over a [`Store`]
pub struct Engine<D, V, I, C: Clock> {
    pub(crate) directory: D,
    pub(crate) views: V,
    pub(crate) inventory: I,
    pub(crate) store: Arc<Store>,
    pub(crate) clock: C,
    pub(crate) config: EngineConfig,
    /// Held while a sweep runs
    pub(crate) sweeping: AtomicBool,
}

impl<D, V, I, C> Engine<D, V, I, C>
where
    D: TargetDirectory,
    V: ViewSettings,
    I: InventoryAdapter,
    C: Clock,
{
    pub fn new(deps: EngineDeps<D, V, I>, clock: C, config: EngineConfig) -> Self {
        Self {
            directory: deps.directory,
            views: deps.views,
            inventory: deps.inventory,
            store: deps.store,
            clock,
            config,
            sweeping: AtomicBool::new(false),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Ledger row with its tracker and app rows.
    pub fn get_operation(&self, operation_id: &OperationId) -> Result<OperationDetail, EngineError> {
        let operation = self
            .store
            .operations
            .get(operation_id)
            .ok_or_else(|| EngineError::OperationNotFound(operation_id.clone()))?;
        let agents = self.store.agents_of(operation_id);
        let from = (operation_id.clone(), AgentId::new(""), AppId::new(""));
        let apps = self.store.apps.range_while(&from, |(op, _, _)| op == operation_id);
        debug!(%operation_id, agents = agents.len(), apps = apps.len(), "get operation");
        Ok(OperationDetail { operation, agents, apps })
    }

    /// One page of the operations that pass `filter`, in its order.
    pub fn list_operations(&self, filter: &OperationFilter) -> OperationPage {
        let targeted: Option<HashSet<OperationId>> = filter.agent_id.as_ref().map(|agent_id| {
            self.store
                .agents
                .filter(|t| t.agent_id == *agent_id)
                .into_iter()
                .map(|t| t.operation_id)
                .collect()
        });
        let mut ops = self.store.operations.filter(|op| {
            filter.matches(op) && targeted.as_ref().is_none_or(|ids| ids.contains(&op.id))
        });
        ops.sort_by(|a, b| filter.compare(a, b));
        let total = ops.len();
        let operations = filter.page(ops);
        debug!(total, returned = operations.len(), offset = filter.offset, "list operations");
        OperationPage { total, operations }
    }

    /// An agent's pending entries, without delivering them.
    pub fn queue(&self, agent_id: &AgentId) -> Vec<QueueEntry> {
        self.store.queue.list(agent_id)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
