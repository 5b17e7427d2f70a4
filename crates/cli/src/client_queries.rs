// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query and command methods for DaemonClient.

use fq_core::{AgentId, Operation, OperationFilter, OperationId, QueueEntry, QueueEntryId};
use fq_wire::{OperationDetail, Query, Request, Response, TargetFailureEntry};
use serde::Serialize;

use crate::client::{ClientError, DaemonClient};

/// Outcome of `operation create`
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOperation {
    pub operation: Operation,
    pub targets: Vec<AgentId>,
    pub failures: Vec<TargetFailureEntry>,
}

/// Outcome of a result report
#[derive(Debug, Clone, Serialize)]
pub struct Recorded {
    pub agent_status: fq_core::AgentOperationStatus,
    pub operation_status: fq_core::OperationStatus,
    pub duplicate: bool,
}

/// Daemon status snapshot
#[derive(Debug, Clone, Serialize)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub operations: usize,
    pub operations_active: usize,
    pub queued_entries: usize,
}

/// Outcome of a manual sweep
#[derive(Debug, Clone, Serialize)]
pub struct Swept {
    pub examined: usize,
    pub expired: usize,
    pub skipped: bool,
}

impl DaemonClient {
    /// Create an operation; the request must be `Request::CreateOperation`.
    pub async fn create_operation(&self, request: &Request) -> Result<CreatedOperation, ClientError> {
        match self.send(request).await? {
            Response::OperationCreated { operation, targets, failures } => {
                Ok(CreatedOperation { operation, targets, failures })
            }
            other => Self::reject(other),
        }
    }

    pub async fn get_operation(&self, operation_id: OperationId) -> Result<OperationDetail, ClientError> {
        let request = Request::Query { query: Query::GetOperation { operation_id } };
        match self.send(&request).await? {
            Response::Operation { detail } => Ok(*detail),
            other => Self::reject(other),
        }
    }

    /// One page of operations, with the number that matched before paging
    pub async fn list_operations(
        &self,
        filter: OperationFilter,
    ) -> Result<(Vec<Operation>, usize), ClientError> {
        let request = Request::Query { query: Query::ListOperations { filter } };
        match self.send(&request).await? {
            Response::Operations { operations, total } => Ok((operations, total)),
            other => Self::reject(other),
        }
    }

    /// Pending entries for an agent, without delivering them
    pub async fn agent_queue(&self, agent_id: AgentId) -> Result<Vec<QueueEntry>, ClientError> {
        let request = Request::Query { query: Query::AgentQueue { agent_id } };
        match self.send(&request).await? {
            Response::Entries { entries } => Ok(entries),
            other => Self::reject(other),
        }
    }

    pub async fn checkin(&self, agent_id: AgentId) -> Result<Vec<QueueEntry>, ClientError> {
        match self.send(&Request::Checkin { agent_id }).await? {
            Response::Entries { entries } => Ok(entries),
            other => Self::reject(other),
        }
    }

    pub async fn ack(&self, agent_id: AgentId, entry_ids: Vec<QueueEntryId>) -> Result<usize, ClientError> {
        match self.send(&Request::Ack { agent_id, entry_ids }).await? {
            Response::Acked { removed } => Ok(removed),
            other => Self::reject(other),
        }
    }

    /// Send `ReportResult` or `ReportAppResult`.
    pub async fn report(&self, request: &Request) -> Result<Recorded, ClientError> {
        match self.send(request).await? {
            Response::ResultRecorded { agent_status, operation_status, duplicate } => {
                Ok(Recorded { agent_status, operation_status, duplicate })
            }
            other => Self::reject(other),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, operations, operations_active, queued_entries } => {
                Ok(DaemonStatus { uptime_secs, operations, operations_active, queued_entries })
            }
            other => Self::reject(other),
        }
    }

    pub async fn sweep(&self) -> Result<Swept, ClientError> {
        match self.send(&Request::Sweep).await? {
            Response::Swept { examined, expired, skipped } => Ok(Swept { examined, expired, skipped }),
            other => Self::reject(other),
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: crate::VERSION.to_string(), token: None };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }
}
