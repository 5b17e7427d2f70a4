// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use fq_core::AgentId;
use fq_wire::{ErrorKind, Query, Request, Response};
use tokio::io::{AsyncWriteExt, DuplexStream};

use super::*;
use crate::config::Settings;

const TIMEOUT: Duration = Duration::from_secs(2);

/// Serve one connection from `source` and return the client's response.
async fn roundtrip(ctx: Arc<ListenCtx>, source: ConnectionSource, request: &Request) -> Response {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(async move {
        let (reader, writer) = tokio::io::split(server);
        handle_connection(reader, writer, source, &ctx).await
    });

    let (mut reader, mut writer) = tokio::io::split(client);
    fq_wire::write_request(&mut writer, request, TIMEOUT).await.unwrap();
    let response = fq_wire::read_response(&mut reader, TIMEOUT).await.unwrap();
    drop(writer);
    drop(reader);
    server_task.await.unwrap().unwrap();
    response
}

fn ctx_with_token(token: Option<&str>) -> Arc<ListenCtx> {
    let mut ctx = test_ctx(&Settings::default());
    ctx.auth_token = token.map(str::to_string);
    Arc::new(ctx)
}

fn hello(token: Option<&str>) -> Request {
    Request::Hello { version: "0".into(), token: token.map(str::to_string) }
}

#[tokio::test]
async fn unix_ping_pongs() {
    let response = roundtrip(ctx_with_token(None), ConnectionSource::Unix, &Request::Ping).await;
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn hello_reports_protocol_version() {
    let response = roundtrip(ctx_with_token(None), ConnectionSource::Unix, &hello(None)).await;
    assert_eq!(response, Response::Hello { version: PROTOCOL_VERSION.to_string() });
}

#[tokio::test]
async fn tcp_must_start_with_hello() {
    let response = roundtrip(ctx_with_token(None), ConnectionSource::Tcp, &Request::Status).await;
    assert!(matches!(response, Response::Error { kind: ErrorKind::Unauthorized, .. }));
}

#[tokio::test]
async fn tcp_hello_checks_token() {
    let ctx = ctx_with_token(Some("s3cret"));

    let rejected = roundtrip(Arc::clone(&ctx), ConnectionSource::Tcp, &hello(Some("guess"))).await;
    assert_eq!(rejected, Response::error(ErrorKind::Unauthorized, "unauthorized"));

    let missing = roundtrip(Arc::clone(&ctx), ConnectionSource::Tcp, &hello(None)).await;
    assert!(matches!(missing, Response::Error { kind: ErrorKind::Unauthorized, .. }));

    let accepted = roundtrip(ctx, ConnectionSource::Tcp, &hello(Some("s3cret"))).await;
    assert!(matches!(accepted, Response::Hello { .. }));
}

#[tokio::test]
async fn unix_skips_token_check() {
    let ctx = ctx_with_token(Some("s3cret"));
    let response = roundtrip(ctx, ConnectionSource::Unix, &Request::Status).await;
    assert!(matches!(response, Response::Status { operations: 0, .. }));
}

#[tokio::test]
async fn shutdown_notifies_daemon() {
    let ctx = ctx_with_token(None);
    let notified = Arc::clone(&ctx.shutdown);
    let response = roundtrip(ctx, ConnectionSource::Unix, &Request::Shutdown).await;
    assert_eq!(response, Response::ShuttingDown);
    tokio::time::timeout(TIMEOUT, notified.notified()).await.unwrap();
}

#[tokio::test]
async fn malformed_json_gets_bad_request() {
    let ctx = ctx_with_token(None);
    let (client, server) = tokio::io::duplex(1024);
    let server_task = tokio::spawn(async move {
        let (reader, writer) = tokio::io::split(server);
        handle_connection(reader, writer, ConnectionSource::Unix, &ctx).await
    });

    let (mut reader, mut writer) = tokio::io::split::<DuplexStream>(client);
    fq_wire::write_message(&mut writer, b"{\"type\":\"Nope\"}").await.unwrap();
    let response = fq_wire::read_response(&mut reader, TIMEOUT).await.unwrap();
    writer.shutdown().await.unwrap();
    server_task.await.unwrap().unwrap();

    assert!(matches!(response, Response::Error { kind: ErrorKind::BadRequest, retryable: false, .. }));
}

#[tokio::test]
async fn requests_flow_through_to_engine() {
    let ctx = ctx_with_token(None);
    let create = Request::CreateOperation {
        action: fq_core::Action::Reboot,
        plugin: None,
        agent_ids: vec![AgentId::new("agent-1")],
        tag_id: None,
        created_by: "admin".into(),
        view_name: "global".into(),
        throttle: None,
        server_ttl_minutes: None,
        agent_deadline_ms: None,
        payload: serde_json::Value::Null,
        apps: Default::default(),
    };
    let Response::OperationCreated { operation, .. } =
        roundtrip(Arc::clone(&ctx), ConnectionSource::Unix, &create).await
    else {
        panic!("expected OperationCreated");
    };

    let checkin = Request::Checkin { agent_id: AgentId::new("agent-1") };
    let Response::Entries { entries } = roundtrip(Arc::clone(&ctx), ConnectionSource::Unix, &checkin).await
    else {
        panic!("expected entries");
    };
    assert_eq!(entries.len(), 1);

    let ack = Request::Ack {
        agent_id: AgentId::new("agent-1"),
        entry_ids: entries.iter().map(|e| e.id.clone()).collect(),
    };
    assert_eq!(
        roundtrip(Arc::clone(&ctx), ConnectionSource::Unix, &ack).await,
        Response::Acked { removed: 1 }
    );

    let query = Request::Query { query: Query::AgentQueue { agent_id: AgentId::new("agent-1") } };
    assert_eq!(
        roundtrip(Arc::clone(&ctx), ConnectionSource::Unix, &query).await,
        Response::Entries { entries: vec![] }
    );

    let report = Request::ReportResult {
        operation_id: operation.id,
        agent_id: AgentId::new("agent-1"),
        success: "false".into(),
        error: Some("disk full".into()),
        status_code: None,
    };
    let Response::ResultRecorded { operation_status, .. } =
        roundtrip(ctx, ConnectionSource::Unix, &report).await
    else {
        panic!("expected receipt");
    };
    assert_eq!(operation_status, fq_core::OperationStatus::ResultsCompletedFailed);
}
