// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query types for reading daemon state.

use fq_core::{AgentId, OperationFilter, OperationId};
use serde::{Deserialize, Serialize};

/// Query types for reading daemon state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Query {
    /// Ledger row with its tracker and app rows
    GetOperation { operation_id: OperationId },
    /// Filtered, sorted, and paged operations
    ListOperations {
        #[serde(default)]
        filter: OperationFilter,
    },
    /// An agent's pending entries, without delivering them
    AgentQueue { agent_id: AgentId },
}
