// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation ledger row: the top-level work record and its aggregate
//! counters.
//!
//! Per-agent progress reaches the ledger only as [`Rollup`] values produced
//! by the tracker state machine. Applying a rollup is the single place the
//! counters move, so the balance invariant
//! (`total == pending + completed + completed_with_errors + failed + expired`)
//! is maintained here and nowhere else.

use serde::{Deserialize, Serialize};

use crate::action::{Action, PerformedOn, Plugin, Throttle};
use crate::id::{OperationId, TagId};

/// Aggregate status of an operation across all of its agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Written by the dispatcher, nothing reported yet
    Created,
    ResultsIncomplete,
    ResultsCompleted,
    ResultsCompletedWithErrors,
    ResultsCompletedFailed,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::ResultsCompleted
                | OperationStatus::ResultsCompletedWithErrors
                | OperationStatus::ResultsCompletedFailed
        )
    }
}

crate::simple_display! {
    OperationStatus {
        Created => "created",
        ResultsIncomplete => "results_incomplete",
        ResultsCompleted => "results_completed",
        ResultsCompletedWithErrors => "results_completed_with_errors",
        ResultsCompletedFailed => "results_completed_failed",
    }
}

/// Where an unfinished agent currently sits in the pending counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingStage {
    /// Queue entry not yet delivered
    Pickup,
    /// Delivered, waiting for the agent's report
    Results,
}

/// Terminal outcome of one agent's share of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentOutcome {
    Completed,
    CompletedWithErrors,
    Failed,
    Expired,
}

/// A counter movement produced by a tracker transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rollup {
    /// One agent moved from pending-pickup to pending-results
    PickedUp,
    /// One agent left the pending counters with a terminal outcome
    Finished { from: PendingStage, outcome: AgentOutcome },
}

/// Per-operation agent counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCounts {
    pub total: u32,
    pub pending_pickup: u32,
    #[serde(default)]
    pub pending_results: u32,
    pub completed: u32,
    pub completed_with_errors: u32,
    pub failed: u32,
    pub expired: u32,
}

impl AgentCounts {
    /// Counters for a freshly created operation: every agent awaits pickup.
    pub fn new(total: u32) -> Self {
        Self { total, pending_pickup: total, ..Self::default() }
    }

    /// Agents that have not reached a terminal outcome.
    pub fn pending(&self) -> u32 {
        self.pending_pickup + self.pending_results
    }

    fn accounted(&self) -> u32 {
        self.completed + self.completed_with_errors + self.failed + self.expired
    }

    /// `total == pending + completed + completed_with_errors + failed + expired`
    pub fn is_balanced(&self) -> bool {
        self.total == self.pending() + self.accounted()
    }

    /// Apply one counter movement.
    ///
    /// Decrements saturate and fall back to the other pending stage, and
    /// outcome counters never exceed `total`, so a rollup that arrives for an
    /// agent the counters have already accounted for leaves them unchanged.
    pub fn apply(&mut self, rollup: Rollup) {
        match rollup {
            Rollup::PickedUp => {
                if self.pending_pickup > 0 {
                    self.pending_pickup -= 1;
                    self.pending_results += 1;
                }
            }
            Rollup::Finished { from, outcome } => {
                if !self.take_pending(from) {
                    return;
                }
                let counter = match outcome {
                    AgentOutcome::Completed => &mut self.completed,
                    AgentOutcome::CompletedWithErrors => &mut self.completed_with_errors,
                    AgentOutcome::Failed => &mut self.failed,
                    AgentOutcome::Expired => &mut self.expired,
                };
                *counter += 1;
            }
        }
    }

    fn take_pending(&mut self, from: PendingStage) -> bool {
        let (first, second) = match from {
            PendingStage::Pickup => (&mut self.pending_pickup, &mut self.pending_results),
            PendingStage::Results => (&mut self.pending_results, &mut self.pending_pickup),
        };
        if *first > 0 {
            *first -= 1;
            true
        } else if *second > 0 {
            *second -= 1;
            true
        } else {
            false
        }
    }

    /// Derive the aggregate status. Rules are evaluated in order; first match wins.
    pub fn status(&self) -> OperationStatus {
        let Self { total: t, completed: c, completed_with_errors: x, failed: f, expired: e, .. } =
            *self;
        if t == c {
            OperationStatus::ResultsCompleted
        } else if t == f || t == e || t == f + e {
            OperationStatus::ResultsCompletedFailed
        } else if t == f + x || t == x + e || t == f + x + e {
            OperationStatus::ResultsCompletedWithErrors
        } else if t == c + x + f + e {
            // Any other fully accounted mix
            OperationStatus::ResultsCompletedWithErrors
        } else {
            OperationStatus::ResultsIncomplete
        }
    }
}

/// The ledger row for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub action: Action,
    pub plugin: Plugin,
    pub performed_on: PerformedOn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<TagId>,
    pub created_by: String,
    pub view_name: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    pub agents: AgentCounts,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<Throttle>,
}

impl Operation {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a rollup and recompute the aggregate status.
    ///
    /// Returns false when nothing changed (terminal ledger or a rollup the
    /// counters absorb). A ledger row is read-only once terminal.
    pub fn apply_rollup(&mut self, rollup: Rollup, now_ms: u64) -> bool {
        if self.is_terminal() {
            return false;
        }
        let before = self.agents;
        self.agents.apply(rollup);
        if self.agents == before {
            return false;
        }
        self.status = self.agents.status();
        self.updated_at_ms = now_ms;
        if self.status.is_terminal() {
            self.completed_at_ms = Some(now_ms);
        }
        true
    }
}

crate::builder! {
    pub struct OperationBuilder => Operation {
        into {
            id: OperationId = OperationId::from_string("op-test"),
            created_by: String = "admin",
            view_name: String = "global",
        }
        set {
            action: Action = Action::Reboot,
            plugin: Plugin = Plugin::Core,
            performed_on: PerformedOn = PerformedOn::Agent,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
            agents: AgentCounts = AgentCounts::new(1),
            status: OperationStatus = OperationStatus::Created,
        }
        option {
            tag_id: TagId = None,
            completed_at_ms: u64 = None,
            throttle: Throttle = None,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
