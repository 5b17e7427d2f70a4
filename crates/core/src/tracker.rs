// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent and per-application progress records.
//!
//! Transitions are pure: each method mutates the row in place and returns
//! the [`Rollup`] the ledger must apply, or `None` when the call changed
//! nothing. Callers persist the row only when a rollup (or app change) was
//! produced, which is what makes duplicate reports idempotent.

use serde::{Deserialize, Serialize};

use crate::id::{AgentId, AppId, OperationId};
use crate::operation::{AgentOutcome, PendingStage, Rollup};

/// Error message recorded on trackers the sweeper expires.
pub const EXPIRED_ERROR: &str = "Operation expired";

/// Status of one agent's share of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentOperationStatus {
    PendingPickup,
    PickedUp,
    ResultsReceived,
    ResultsReceivedWithErrors,
    Completed,
    CompletedWithErrors,
    Failed,
    OperationExpired,
}

crate::simple_display! {
    AgentOperationStatus {
        PendingPickup => "pending_pickup",
        PickedUp => "picked_up",
        ResultsReceived => "results_received",
        ResultsReceivedWithErrors => "results_received_with_errors",
        Completed => "completed",
        CompletedWithErrors => "completed_with_errors",
        Failed => "failed",
        OperationExpired => "operation_expired",
    }
}

impl AgentOperationStatus {
    fn pending_stage(&self) -> PendingStage {
        match self {
            AgentOperationStatus::PendingPickup => PendingStage::Pickup,
            _ => PendingStage::Results,
        }
    }
}

/// Parse the literal success flag an agent sends with a result.
pub fn parse_success(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// App counters on a tracker row for app-scoped actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCounts {
    pub total: u32,
    pub pending: u32,
    pub completed: u32,
    pub failed: u32,
}

impl AppCounts {
    pub fn new(total: u32) -> Self {
        Self { total, pending: total, ..Self::default() }
    }

    /// Recount from the agent's app rows.
    pub fn tally<'a>(apps: impl IntoIterator<Item = &'a OperationPerApp>) -> Self {
        let mut counts = Self::default();
        for app in apps {
            counts.total += 1;
            match app.results {
                AppResults::Pending => counts.pending += 1,
                AppResults::Received => counts.completed += 1,
                AppResults::ReceivedWithErrors => counts.failed += 1,
            }
        }
        counts
    }
}

/// Tracker row keyed by (operation, agent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPerAgent {
    pub operation_id: OperationId,
    pub agent_id: AgentId,
    pub status: AgentOperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picked_up_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    /// Present only for app-scoped actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<AppCounts>,
}

impl OperationPerAgent {
    pub fn new(operation_id: OperationId, agent_id: AgentId, apps: Option<u32>) -> Self {
        Self {
            operation_id,
            agent_id,
            status: AgentOperationStatus::PendingPickup,
            picked_up_at_ms: None,
            completed_at_ms: None,
            expired_at_ms: None,
            errors: None,
            apps: apps.map(AppCounts::new),
        }
    }

    /// Whether no further report can change this row.
    ///
    /// `ResultsReceived*` is final for simple actions; app-scoped rows pass
    /// through it while apps are still pending.
    pub fn is_terminal(&self) -> bool {
        match self.status {
            AgentOperationStatus::Completed
            | AgentOperationStatus::CompletedWithErrors
            | AgentOperationStatus::Failed
            | AgentOperationStatus::OperationExpired => true,
            AgentOperationStatus::ResultsReceived
            | AgentOperationStatus::ResultsReceivedWithErrors => self.apps.is_none(),
            AgentOperationStatus::PendingPickup | AgentOperationStatus::PickedUp => false,
        }
    }

    /// Mark the row delivered. Only the first pickup counts.
    pub fn pick_up(&mut self, now_ms: u64) -> Option<Rollup> {
        if self.status != AgentOperationStatus::PendingPickup {
            return None;
        }
        self.status = AgentOperationStatus::PickedUp;
        self.picked_up_at_ms = Some(now_ms);
        Some(Rollup::PickedUp)
    }

    /// Apply an agent-level result for a simple action.
    pub fn record_result(
        &mut self,
        success: bool,
        errors: Option<String>,
        now_ms: u64,
    ) -> Option<Rollup> {
        if self.is_terminal() {
            return None;
        }
        let from = self.status.pending_stage();
        let (status, outcome) = if success {
            (AgentOperationStatus::ResultsReceived, AgentOutcome::Completed)
        } else {
            (AgentOperationStatus::ResultsReceivedWithErrors, AgentOutcome::CompletedWithErrors)
        };
        self.status = status;
        self.completed_at_ms = Some(now_ms);
        self.errors = errors;
        Some(Rollup::Finished { from, outcome })
    }

    /// Recount app counters after an app result and finalize when none are pending.
    ///
    /// A partial result on a row still awaiting pickup counts as the pickup.
    pub fn recount_apps<'a>(
        &mut self,
        apps: impl IntoIterator<Item = &'a OperationPerApp>,
        now_ms: u64,
    ) -> Option<Rollup> {
        if self.is_terminal() {
            return None;
        }
        let counts = AppCounts::tally(apps);
        self.apps = Some(counts);
        let from = self.status.pending_stage();

        if counts.pending > 0 {
            self.status = if counts.failed > 0 {
                AgentOperationStatus::ResultsReceivedWithErrors
            } else {
                AgentOperationStatus::ResultsReceived
            };
            if from != PendingStage::Pickup {
                return None;
            }
            self.picked_up_at_ms = Some(now_ms);
            return Some(Rollup::PickedUp);
        }

        let (status, outcome) = if counts.failed == 0 {
            (AgentOperationStatus::Completed, AgentOutcome::Completed)
        } else if counts.completed == 0 {
            (AgentOperationStatus::Failed, AgentOutcome::Failed)
        } else {
            (AgentOperationStatus::CompletedWithErrors, AgentOutcome::CompletedWithErrors)
        };
        self.status = status;
        self.completed_at_ms = Some(now_ms);
        Some(Rollup::Finished { from, outcome })
    }

    /// Fail the row outright, as when it could not be scheduled.
    pub fn fail(&mut self, error: String, now_ms: u64) -> Option<Rollup> {
        if self.is_terminal() {
            return None;
        }
        let from = self.status.pending_stage();
        self.status = AgentOperationStatus::Failed;
        self.completed_at_ms = Some(now_ms);
        self.errors = Some(error);
        Some(Rollup::Finished { from, outcome: AgentOutcome::Failed })
    }

    /// Expire the row. No-op once terminal.
    pub fn expire(&mut self, now_ms: u64) -> Option<Rollup> {
        if self.is_terminal() {
            return None;
        }
        let from = self.status.pending_stage();
        self.status = AgentOperationStatus::OperationExpired;
        self.expired_at_ms = Some(now_ms);
        self.completed_at_ms = Some(now_ms);
        self.errors = Some(EXPIRED_ERROR.to_string());
        Some(Rollup::Finished { from, outcome: AgentOutcome::Expired })
    }
}

crate::builder! {
    pub struct OperationPerAgentBuilder => OperationPerAgent {
        into {
            operation_id: OperationId = OperationId::from_string("op-test"),
            agent_id: AgentId = "agent-1",
        }
        set {
            status: AgentOperationStatus = AgentOperationStatus::PendingPickup,
        }
        option {
            picked_up_at_ms: u64 = None,
            completed_at_ms: u64 = None,
            expired_at_ms: u64 = None,
            errors: String = None,
            apps: AppCounts = None,
        }
    }
}

/// Result state of one application on one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppResults {
    #[default]
    Pending,
    Received,
    ReceivedWithErrors,
}

crate::simple_display! {
    AppResults {
        Pending => "pending",
        Received => "received",
        ReceivedWithErrors => "received_with_errors",
    }
}

/// A package name and version reported by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Application the dispatcher schedules on an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpec {
    pub app_id: AppId,
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
}

/// What an agent reported for one application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppReport {
    pub success: bool,
    pub errors: Option<String>,
    pub apps_removed: Vec<Package>,
    pub reboot_required: bool,
}

/// Tracker row keyed by (operation, agent, app).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPerApp {
    pub operation_id: OperationId,
    pub agent_id: AgentId,
    pub app_id: AppId,
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    pub results: AppResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_received_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps_removed: Vec<Package>,
    #[serde(default)]
    pub reboot_required: bool,
}

impl OperationPerApp {
    pub fn new(operation_id: OperationId, agent_id: AgentId, app: AppSpec) -> Self {
        Self {
            operation_id,
            agent_id,
            app_id: app.app_id,
            app_name: app.app_name,
            app_version: app.app_version,
            results: AppResults::Pending,
            results_received_at_ms: None,
            errors: None,
            apps_removed: Vec::new(),
            reboot_required: false,
        }
    }

    /// Record the agent's report. Returns false if a result was already recorded.
    pub fn record(&mut self, report: AppReport, now_ms: u64) -> bool {
        if self.results != AppResults::Pending {
            return false;
        }
        self.results =
            if report.success { AppResults::Received } else { AppResults::ReceivedWithErrors };
        self.results_received_at_ms = Some(now_ms);
        self.errors = report.errors;
        self.apps_removed = report.apps_removed;
        self.reboot_required = report.reboot_required;
        true
    }
}

crate::builder! {
    pub struct OperationPerAppBuilder => OperationPerApp {
        into {
            operation_id: OperationId = OperationId::from_string("op-test"),
            agent_id: AgentId = "agent-1",
            app_id: AppId = "app-1",
            app_name: String = "firefox",
            app_version: String = "1.0",
        }
        set {
            results: AppResults = AppResults::Pending,
            apps_removed: Vec<Package> = Vec::new(),
            reboot_required: bool = false,
        }
        option {
            results_received_at_ms: u64 = None,
            errors: String = None,
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
