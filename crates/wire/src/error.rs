// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds carried in responses, and how clients should treat them.

use serde::{Deserialize, Serialize};

/// Classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No tracker row for the reported key
    InvalidOperationId,
    /// Success flag was not "true" or "false"
    InvalidSuccessValue,
    /// Report shape does not match the operation's action
    WrongResultKind,
    /// Request names no agent that can receive work
    NoTargets,
    /// App-scoped action without apps for a target
    MissingApps,
    AgentDisabled,
    UnknownTag,
    OperationNotFound,
    /// Ledger insert did not apply
    FailedToCreateOperation,
    /// Ledger rollup did not apply after retries
    ResultsFailedToUpdate,
    /// A collaborator service could not be reached
    Unavailable,
    Unauthorized,
    BadRequest,
    Internal,
}

/// How a client should treat an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// HTTP-equivalent status
    pub status: u16,
    pub retryable: bool,
}

const fn policy(status: u16, retryable: bool) -> ErrorPolicy {
    ErrorPolicy { status, retryable }
}

/// Every error kind with its policy.
pub const ERROR_TABLE: [(ErrorKind, ErrorPolicy); 14] = [
    (ErrorKind::InvalidOperationId, policy(404, false)),
    (ErrorKind::InvalidSuccessValue, policy(400, false)),
    (ErrorKind::WrongResultKind, policy(400, false)),
    (ErrorKind::NoTargets, policy(400, false)),
    (ErrorKind::MissingApps, policy(400, false)),
    (ErrorKind::AgentDisabled, policy(409, false)),
    (ErrorKind::UnknownTag, policy(404, false)),
    (ErrorKind::OperationNotFound, policy(404, false)),
    (ErrorKind::FailedToCreateOperation, policy(500, true)),
    (ErrorKind::ResultsFailedToUpdate, policy(500, true)),
    (ErrorKind::Unavailable, policy(500, true)),
    (ErrorKind::Unauthorized, policy(400, false)),
    (ErrorKind::BadRequest, policy(400, false)),
    (ErrorKind::Internal, policy(500, false)),
];

impl ErrorKind {
    pub fn policy(self) -> ErrorPolicy {
        ERROR_TABLE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, policy)| *policy)
            .unwrap_or(policy(500, false))
    }

    pub fn status(self) -> u16 {
        self.policy().status
    }

    pub fn is_retryable(self) -> bool {
        self.policy().retryable
    }
}

fq_core::simple_display! {
    ErrorKind {
        InvalidOperationId => "invalid_operation_id",
        InvalidSuccessValue => "invalid_success_value",
        WrongResultKind => "wrong_result_kind",
        NoTargets => "no_targets",
        MissingApps => "missing_apps",
        AgentDisabled => "agent_disabled",
        UnknownTag => "unknown_tag",
        OperationNotFound => "operation_not_found",
        FailedToCreateOperation => "failed_to_create_operation",
        ResultsFailedToUpdate => "results_failed_to_update",
        Unavailable => "unavailable",
        Unauthorized => "unauthorized",
        BadRequest => "bad_request",
        Internal => "internal",
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
