// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn error_takes_retry_flag_from_kind() {
    assert_eq!(
        Response::error(ErrorKind::ResultsFailedToUpdate, "contended"),
        Response::Error {
            kind: ErrorKind::ResultsFailedToUpdate,
            message: "contended".to_string(),
            retryable: true,
        }
    );
    let Response::Error { retryable, .. } = Response::error(ErrorKind::InvalidSuccessValue, "x")
    else {
        panic!("wrong variant");
    };
    assert!(!retryable);
}

#[test]
fn error_serializes_kind_in_snake_case() {
    let json = serde_json::to_value(Response::error(ErrorKind::NoTargets, "none")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "Error", "kind": "no_targets", "message": "none", "retryable": false})
    );
}

#[test]
fn result_recorded_uses_status_wire_names() {
    let json = serde_json::to_value(Response::ResultRecorded {
        agent_status: AgentOperationStatus::ResultsReceived,
        operation_status: OperationStatus::ResultsCompleted,
        duplicate: false,
    })
    .unwrap();
    assert_eq!(json["agent_status"], "results_received");
    assert_eq!(json["operation_status"], "results_completed");
}
