// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine errors to wire error kinds.

use fq_adapters::DirectoryError;
use fq_engine::{EngineError, TargetFailure};
use fq_wire::{ErrorKind, Response, TargetFailureEntry};

pub(super) fn error_kind(error: &EngineError) -> ErrorKind {
    match error {
        EngineError::InvalidOperationId { .. } => ErrorKind::InvalidOperationId,
        EngineError::InvalidSuccessValue(_) => ErrorKind::InvalidSuccessValue,
        EngineError::FailedToCreateOperation(_) => ErrorKind::FailedToCreateOperation,
        EngineError::ResultsFailedToUpdate(_) => ErrorKind::ResultsFailedToUpdate,
        EngineError::WrongResultKind { .. } => ErrorKind::WrongResultKind,
        EngineError::NoTargets => ErrorKind::NoTargets,
        EngineError::MissingApps { .. } => ErrorKind::MissingApps,
        EngineError::DuplicateApp { .. } | EngineError::TooMany(_) => ErrorKind::BadRequest,
        EngineError::AgentDisabled(_) => ErrorKind::AgentDisabled,
        EngineError::OperationNotFound(_) => ErrorKind::OperationNotFound,
        EngineError::Directory(DirectoryError::UnknownTag(_)) => ErrorKind::UnknownTag,
        EngineError::Directory(DirectoryError::Unavailable(_)) => ErrorKind::Unavailable,
    }
}

pub(super) fn error_response(error: &EngineError) -> Response {
    Response::error(error_kind(error), error.to_string())
}

pub(super) fn failure_entry(failure: TargetFailure) -> TargetFailureEntry {
    TargetFailureEntry {
        kind: error_kind(&failure.error),
        message: failure.error.to_string(),
        agent_id: failure.agent_id,
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
