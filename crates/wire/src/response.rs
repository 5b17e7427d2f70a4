// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fq_core::{AgentId, AgentOperationStatus, Operation, OperationStatus, QueueEntry};
use serde::{Deserialize, Serialize};

use super::{ErrorKind, OperationDetail, TargetFailureEntry};

/// Response from daemon to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Daemon status
    Status {
        uptime_secs: u64,
        operations: usize,
        operations_active: usize,
        queued_entries: usize,
    },

    /// Operation was created
    OperationCreated {
        operation: Operation,
        targets: Vec<AgentId>,
        #[serde(default)]
        failures: Vec<TargetFailureEntry>,
    },

    /// Single operation with its trackers
    Operation { detail: Box<OperationDetail> },

    /// One page of a filtered operation listing
    Operations {
        operations: Vec<Operation>,
        /// Matching operations before paging
        #[serde(default)]
        total: usize,
    },

    /// Queue entries, delivered or listed
    Entries { entries: Vec<QueueEntry> },

    /// Entries removed by an ack
    Acked { removed: usize },

    /// A result report was applied or recognized as a duplicate
    ResultRecorded {
        agent_status: AgentOperationStatus,
        operation_status: OperationStatus,
        duplicate: bool,
    },

    /// Sweep outcome; `skipped` when another sweep was running
    Swept { examined: usize, expired: usize, skipped: bool },

    /// Error response
    Error {
        kind: ErrorKind,
        message: String,
        #[serde(default)]
        retryable: bool,
    },
}

impl Response {
    /// Error response with the retry flag taken from the kind's policy.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error { kind, message: message.into(), retryable: kind.is_retryable() }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
