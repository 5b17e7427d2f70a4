// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result reports pushed by agents.

use fq_adapters::{InventoryAdapter, TargetDirectory, ViewSettings};
use fq_core::{
    parse_success, AgentId, AgentOperationStatus, AppId, AppReport, Clock, Operation, OperationId,
    OperationStatus, Package,
};
use fq_storage::WriteOutcome;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::ledger;

/// Agent-level result for a simple action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReport {
    pub operation_id: OperationId,
    pub agent_id: AgentId,
    /// Literal `"true"` or `"false"`
    pub success: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// Result for one application of an app-scoped action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppResultReport {
    pub operation_id: OperationId,
    pub agent_id: AgentId,
    pub app_id: AppId,
    pub success: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub apps_to_add: Vec<Package>,
    #[serde(default)]
    pub apps_to_delete: Vec<Package>,
    #[serde(default)]
    pub reboot_required: bool,
}

/// State after a report was applied (or recognized as a duplicate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReceipt {
    pub agent_status: AgentOperationStatus,
    pub operation_status: OperationStatus,
    /// The report changed nothing
    pub duplicate: bool,
}

impl<D, V, I, C> Engine<D, V, I, C>
where
    D: TargetDirectory,
    V: ViewSettings,
    I: InventoryAdapter,
    C: Clock,
{
    /// Record an agent's result for a simple action.
    pub fn report_result(&self, report: ResultReport) -> Result<ResultReceipt, EngineError> {
        let ResultReport { operation_id, agent_id, success, error, status_code } = report;
        let invalid = || EngineError::InvalidOperationId {
            operation_id: operation_id.clone(),
            agent_id: agent_id.clone(),
            app_id: None,
        };

        let key = (operation_id.clone(), agent_id.clone());
        if !self.store.agents.contains(&key) {
            warn!(%operation_id, %agent_id, "result for unknown operation");
            return Err(invalid());
        }
        let operation = self.store.operations.get(&operation_id).ok_or_else(invalid)?;
        if operation.action.is_app_scoped() {
            warn!(%operation_id, %agent_id, action = %operation.action, "agent result for app-scoped action");
            return Err(EngineError::WrongResultKind {
                operation_id: operation_id.clone(),
                action: operation.action,
                kind: "agent",
            });
        }
        let success = parse_success(&success).ok_or_else(|| {
            warn!(%operation_id, %agent_id, value = %success, "invalid success value");
            EngineError::InvalidSuccessValue(success.clone())
        })?;

        let now = self.clock.epoch_ms();
        let (operation, duplicate) =
            match self.store.agents.update(&key, |t| t.record_result(success, error, now)) {
                WriteOutcome::Replaced(rollup) => {
                    (ledger::apply_rollup(&self.store, &operation_id, rollup, now)?, false)
                }
                WriteOutcome::Unchanged => (operation, true),
                WriteOutcome::Absent => return Err(invalid()),
            };

        self.store.queue.remove_for_operation(&agent_id, &operation_id);
        let receipt = self.receipt(&key, &operation, duplicate)?;
        if duplicate {
            debug!(%operation_id, %agent_id, "duplicate result ignored");
        } else {
            info!(
                %operation_id,
                %agent_id,
                success,
                status_code,
                agent_status = %receipt.agent_status,
                operation_status = %receipt.operation_status,
                "result recorded"
            );
        }
        Ok(receipt)
    }

    /// Record an agent's result for one application and roll the tracker up
    /// once no apps remain pending.
    pub async fn report_app_result(
        &self,
        report: AppResultReport,
    ) -> Result<ResultReceipt, EngineError> {
        let AppResultReport {
            operation_id,
            agent_id,
            app_id,
            success,
            error,
            status_code,
            apps_to_add,
            apps_to_delete,
            reboot_required,
        } = report;
        let invalid = || EngineError::InvalidOperationId {
            operation_id: operation_id.clone(),
            agent_id: agent_id.clone(),
            app_id: Some(app_id.clone()),
        };

        let key = (operation_id.clone(), agent_id.clone());
        let app_key = (operation_id.clone(), agent_id.clone(), app_id.clone());
        if !self.store.apps.contains(&app_key) {
            warn!(%operation_id, %agent_id, %app_id, "app result for unknown operation");
            return Err(invalid());
        }
        let operation = self.store.operations.get(&operation_id).ok_or_else(invalid)?;
        if !operation.action.is_app_scoped() {
            return Err(EngineError::WrongResultKind {
                operation_id: operation_id.clone(),
                action: operation.action,
                kind: "per-app",
            });
        }
        let success = parse_success(&success).ok_or_else(|| {
            warn!(%operation_id, %agent_id, %app_id, value = %success, "invalid success value");
            EngineError::InvalidSuccessValue(success.clone())
        })?;

        // Late reports on a finished or expired tracker change nothing
        let tracker = self.store.agents.get(&key).ok_or_else(invalid)?;
        if tracker.is_terminal() {
            debug!(%operation_id, %agent_id, %app_id, status = %tracker.status, "app result after finish");
            self.store.queue.remove_for_operation(&agent_id, &operation_id);
            return self.receipt(&key, &operation, true);
        }

        let now = self.clock.epoch_ms();
        let app_report =
            AppReport { success, errors: error, apps_removed: apps_to_delete.clone(), reboot_required };
        match self.store.apps.update(&app_key, |row| row.record(app_report, now).then_some(())) {
            WriteOutcome::Replaced(()) => {}
            WriteOutcome::Unchanged => {
                debug!(%operation_id, %agent_id, %app_id, "duplicate app result ignored");
                return self.receipt(&key, &operation, true);
            }
            WriteOutcome::Absent => return Err(invalid()),
        }

        if !apps_to_add.is_empty() || !apps_to_delete.is_empty() {
            if let Err(e) =
                self.inventory.record_app_changes(&agent_id, &apps_to_add, &apps_to_delete).await
            {
                warn!(%operation_id, %agent_id, error = %e, "failed to record app changes");
            }
        }

        let apps = self.store.apps_of(&operation_id, &agent_id);
        let recount = self.store.agents.update(&key, |t| {
            let before = t.clone();
            let rollup = t.recount_apps(apps.iter(), now);
            (*t != before).then_some(rollup)
        });
        let operation = match recount {
            WriteOutcome::Replaced(Some(rollup)) => {
                ledger::apply_rollup(&self.store, &operation_id, rollup, now)?
            }
            WriteOutcome::Replaced(None) | WriteOutcome::Unchanged => {
                self.store.operations.get(&operation_id).unwrap_or(operation)
            }
            WriteOutcome::Absent => return Err(invalid()),
        };

        // The entry stays queued, and can still expire, until every app has reported
        if self.store.agents.get(&key).is_some_and(|t| t.is_terminal()) {
            self.store.queue.remove_for_operation(&agent_id, &operation_id);
        }
        let receipt = self.receipt(&key, &operation, false)?;
        info!(
            %operation_id,
            %agent_id,
            %app_id,
            success,
            status_code,
            agent_status = %receipt.agent_status,
            operation_status = %receipt.operation_status,
            "app result recorded"
        );
        Ok(receipt)
    }

    fn receipt(
        &self,
        key: &(OperationId, AgentId),
        operation: &Operation,
        duplicate: bool,
    ) -> Result<ResultReceipt, EngineError> {
        let tracker = self.store.agents.get(key).ok_or_else(|| EngineError::InvalidOperationId {
            operation_id: key.0.clone(),
            agent_id: key.1.clone(),
            app_id: None,
        })?;
        Ok(ResultReceipt {
            agent_status: tracker.status,
            operation_status: operation.status,
            duplicate,
        })
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
