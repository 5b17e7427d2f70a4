// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation creation: target resolution, ledger insert, and fan-out.

use std::collections::{BTreeMap, HashSet};

use fq_adapters::{InventoryAdapter, TargetDirectory, ViewSettings};
use fq_core::{
    Action, AgentCounts, AgentId, AgentOutcome, AppSpec, Clock, Operation, OperationId,
    OperationPerAgent, OperationPerApp, OperationStatus, PendingStage, PerformedOn, Plugin,
    QueueEntry, QueueTtl, Rollup, TagId, Throttle,
};
use fq_storage::{agent_key, app_key, WriteOutcome};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::{EngineError, TargetFailure};
use crate::ledger;

/// Request to create an operation
#[derive(Debug, Clone)]
pub struct CreateOperation {
    pub action: Action,
    /// Defaults to the action's plugin
    pub plugin: Option<Plugin>,
    pub agent_ids: Vec<AgentId>,
    pub tag_id: Option<TagId>,
    pub created_by: String,
    pub view_name: String,
    pub throttle: Option<Throttle>,
    /// Overrides the view's server TTL
    pub server_ttl_minutes: Option<u64>,
    /// Absolute agent deadline; kept only if later than the server deadline
    pub agent_deadline_ms: Option<u64>,
    pub payload: Value,
    /// Apps per agent, for app-scoped actions
    pub apps: BTreeMap<AgentId, Vec<AppSpec>>,
}

impl CreateOperation {
    pub fn new(action: Action, view_name: impl Into<String>) -> Self {
        Self {
            action,
            plugin: None,
            agent_ids: Vec::new(),
            tag_id: None,
            created_by: String::new(),
            view_name: view_name.into(),
            throttle: None,
            server_ttl_minutes: None,
            agent_deadline_ms: None,
            payload: Value::Null,
            apps: BTreeMap::new(),
        }
    }

    fq_core::setters! {
        into { created_by: String }
        set { agent_ids: Vec<AgentId>, payload: Value }
        option { plugin: Plugin, tag_id: TagId, throttle: Throttle, server_ttl_minutes: u64, agent_deadline_ms: u64 }
    }

    /// Schedule `apps` on `agent_id`.
    pub fn apps_for(mut self, agent_id: impl Into<AgentId>, apps: Vec<AppSpec>) -> Self {
        self.apps.insert(agent_id.into(), apps);
        self
    }
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct Created {
    pub operation: Operation,
    /// Agents that were scheduled, in dispatch order
    pub targets: Vec<AgentId>,
    pub failures: Vec<TargetFailure>,
}

impl<D, V, I, C> Engine<D, V, I, C>
where
    D: TargetDirectory,
    V: ViewSettings,
    I: InventoryAdapter,
    C: Clock,
{
    /// Create an operation and enqueue it for every resolved target.
    pub async fn create_operation(&self, req: CreateOperation) -> Result<Created, EngineError> {
        let mut failures = Vec::new();
        let targets = self.resolve_targets(&req, &mut failures).await?;

        if req.action.is_app_scoped() {
            if let Some(agent_id) =
                targets.iter().find(|a| req.apps.get(*a).is_none_or(|apps| apps.is_empty()))
            {
                return Err(EngineError::MissingApps {
                    action: req.action,
                    agent_id: agent_id.clone(),
                });
            }
            for agent_id in &targets {
                check_apps(agent_id, req.apps.get(agent_id).map(Vec::as_slice).unwrap_or_default())?;
            }
        }
        if targets.is_empty() {
            return Err(EngineError::NoTargets);
        }

        let total = u32::try_from(targets.len()).map_err(|_| EngineError::TooMany("targets"))?;
        let now = self.clock.epoch_ms();
        let operation = Operation {
            id: OperationId::new(),
            action: req.action,
            plugin: req.plugin.unwrap_or_else(|| req.action.default_plugin()),
            performed_on: if req.tag_id.is_some() { PerformedOn::Tag } else { PerformedOn::Agent },
            tag_id: req.tag_id.clone(),
            created_by: req.created_by.clone(),
            view_name: req.view_name.clone(),
            created_at_ms: now,
            updated_at_ms: now,
            completed_at_ms: None,
            agents: AgentCounts::new(total),
            status: OperationStatus::Created,
            throttle: req.throttle,
        };
        let operation_id = operation.id.clone();
        if self.store.operations.insert(operation_id.clone(), operation.clone()).is_err() {
            return Err(EngineError::FailedToCreateOperation(operation_id));
        }

        let view = self.views.queue_ttl(&req.view_name);
        let ttl = QueueTtl::compute(
            now,
            req.server_ttl_minutes.unwrap_or(view.server_queue_ttl_minutes),
            view.agent_queue_ttl_minutes,
            req.agent_deadline_ms,
        );

        let scheduled = self.fan_out(&operation, targets, &req, ttl, now, &mut failures)?;

        let operation = self.store.operations.get(&operation_id).unwrap_or(operation);
        info!(
            %operation_id,
            action = %operation.action,
            view = %operation.view_name,
            targets = scheduled.len(),
            failures = failures.len(),
            "operation created"
        );
        Ok(Created { operation, targets: scheduled, failures })
    }

    /// Schedule every target. Targets that fail land in `failures`.
    pub(crate) fn fan_out(
        &self,
        operation: &Operation,
        targets: Vec<AgentId>,
        req: &CreateOperation,
        ttl: QueueTtl,
        now: u64,
        failures: &mut Vec<TargetFailure>,
    ) -> Result<Vec<AgentId>, EngineError> {
        let operation_id = &operation.id;
        let mut scheduled = Vec::with_capacity(targets.len());
        for agent_id in targets {
            let apps = req.apps.get(&agent_id).filter(|_| req.action.is_app_scoped());
            match self.schedule_target(operation, &agent_id, apps, req, ttl, now) {
                Ok(()) => scheduled.push(agent_id),
                Err(error) => {
                    warn!(%operation_id, %agent_id, %error, "failed to schedule target");
                    self.fail_target(operation_id, &agent_id, &error, now)?;
                    failures.push(TargetFailure { agent_id, error });
                }
            }
        }
        Ok(scheduled)
    }

    /// Account for a target that could not be scheduled.
    ///
    /// A tracker row already written is failed in place, so reports against
    /// it are duplicates. The ledger counts the target as failed exactly once.
    pub(crate) fn fail_target(
        &self,
        operation_id: &OperationId,
        agent_id: &AgentId,
        error: &EngineError,
        now: u64,
    ) -> Result<(), EngineError> {
        let key = (operation_id.clone(), agent_id.clone());
        let rollup = match self.store.agents.update(&key, |t| t.fail(error.to_string(), now)) {
            WriteOutcome::Replaced(rollup) => rollup,
            WriteOutcome::Unchanged => return Ok(()),
            WriteOutcome::Absent => {
                Rollup::Finished { from: PendingStage::Pickup, outcome: AgentOutcome::Failed }
            }
        };
        self.store.queue.remove_for_operation(agent_id, operation_id);
        ledger::apply_rollup(&self.store, operation_id, rollup, now)?;
        Ok(())
    }

    /// Explicit ids first, then tag members, without duplicates or disabled agents.
    async fn resolve_targets(
        &self,
        req: &CreateOperation,
        failures: &mut Vec<TargetFailure>,
    ) -> Result<Vec<AgentId>, EngineError> {
        let mut candidates = req.agent_ids.clone();
        if let Some(tag_id) = &req.tag_id {
            candidates.extend(self.directory.resolve_tag(tag_id).await?);
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for agent_id in candidates {
            if agent_id.is_empty() || !seen.insert(agent_id.clone()) {
                continue;
            }
            match self.directory.is_enabled(&agent_id).await {
                Ok(true) => targets.push(agent_id),
                Ok(false) => failures.push(TargetFailure {
                    error: EngineError::AgentDisabled(agent_id.clone()),
                    agent_id,
                }),
                Err(e) => failures.push(TargetFailure { agent_id, error: e.into() }),
            }
        }
        Ok(targets)
    }

    fn schedule_target(
        &self,
        operation: &Operation,
        agent_id: &AgentId,
        apps: Option<&Vec<AppSpec>>,
        req: &CreateOperation,
        ttl: QueueTtl,
        now: u64,
    ) -> Result<(), EngineError> {
        let insert_failed = || EngineError::FailedToCreateOperation(operation.id.clone());

        let app_count = apps
            .map(|a| u32::try_from(a.len()).map_err(|_| EngineError::TooMany("apps")))
            .transpose()?;
        let tracker = OperationPerAgent::new(operation.id.clone(), agent_id.clone(), app_count);
        self.store.agents.insert(agent_key(&tracker), tracker).map_err(|_| insert_failed())?;

        for app in apps.into_iter().flatten() {
            let row = OperationPerApp::new(operation.id.clone(), agent_id.clone(), app.clone());
            self.store.apps.insert(app_key(&row), row).map_err(|_| insert_failed())?;
        }

        let entry = QueueEntry::new(
            agent_id.clone(),
            operation.view_name.clone(),
            operation.id.clone(),
            operation.action,
            operation.plugin,
            instruction_payload(&req.payload, apps, operation.throttle),
            ttl,
            now,
        );
        let order_id = self.store.queue.enqueue(entry);
        debug!(operation_id = %operation.id, %agent_id, order_id, "enqueued");
        Ok(())
    }
}

/// Each app may be scheduled once per agent.
fn check_apps(agent_id: &AgentId, apps: &[AppSpec]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    match apps.iter().find(|app| !seen.insert(&app.app_id)) {
        Some(app) => Err(EngineError::DuplicateApp {
            agent_id: agent_id.clone(),
            app_id: app.app_id.clone(),
        }),
        None => Ok(()),
    }
}

/// Instruction body handed to the agent.
///
/// Object payloads are extended in place; anything else is nested under `data`.
fn instruction_payload(
    payload: &Value,
    apps: Option<&Vec<AppSpec>>,
    throttle: Option<Throttle>,
) -> Value {
    let mut body = match payload {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => Map::from_iter([("data".to_string(), other.clone())]),
    };
    if let Some(apps) = apps {
        body.insert("apps".to_string(), serde_json::to_value(apps).unwrap_or_default());
    }
    if let Some(throttle) = throttle {
        if let Ok(Value::Object(fields)) = serde_json::to_value(throttle) {
            body.extend(fields);
        }
    }
    Value::Object(body)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
