// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use fq_adapters::DirectoryError;
use fq_core::{Action, AgentId, AppId, OperationId};
use thiserror::Error;

/// Errors surfaced by engine operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no operation {operation_id} for agent {agent_id}{}", app_suffix(.app_id))]
    InvalidOperationId { operation_id: OperationId, agent_id: AgentId, app_id: Option<AppId> },
    #[error("invalid success value: {0:?}")]
    InvalidSuccessValue(String),
    #[error("failed to create operation {0}")]
    FailedToCreateOperation(OperationId),
    #[error("results failed to update for operation {0}")]
    ResultsFailedToUpdate(OperationId),
    #[error("operation {operation_id} ({action}) does not take {kind} results")]
    WrongResultKind { operation_id: OperationId, action: Action, kind: &'static str },
    #[error("no targets to dispatch to")]
    NoTargets,
    #[error("{action} needs at least one app for agent {agent_id}")]
    MissingApps { action: Action, agent_id: AgentId },
    #[error("app {app_id} is listed more than once for agent {agent_id}")]
    DuplicateApp { agent_id: AgentId, app_id: AppId },
    #[error("too many {0}")]
    TooMany(&'static str),
    #[error("agent {0} is disabled")]
    AgentDisabled(AgentId),
    #[error("operation not found: {0}")]
    OperationNotFound(OperationId),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

fn app_suffix(app_id: &Option<AppId>) -> String {
    app_id.as_ref().map(|app| format!(" app {app}")).unwrap_or_default()
}

impl EngineError {
    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ResultsFailedToUpdate(_)
                | EngineError::FailedToCreateOperation(_)
                | EngineError::Directory(DirectoryError::Unavailable(_))
        )
    }
}

/// A target the dispatcher could not schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub agent_id: AgentId,
    pub error: EngineError,
}
