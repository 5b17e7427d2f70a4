// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data carried inside responses.

use fq_core::{AgentId, Operation, OperationPerAgent, OperationPerApp};
use serde::{Deserialize, Serialize};

use crate::ErrorKind;

/// A ledger row with every tracker row beneath it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDetail {
    pub operation: Operation,
    #[serde(default)]
    pub agents: Vec<OperationPerAgent>,
    #[serde(default)]
    pub apps: Vec<OperationPerApp>,
}

/// A target the dispatcher did not schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFailureEntry {
    pub agent_id: AgentId,
    pub kind: ErrorKind,
    pub message: String,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
