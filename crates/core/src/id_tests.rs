// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn operation_id_has_prefix() {
    let id = OperationId::new();
    assert!(id.as_str().starts_with("op-"));
    assert_eq!(id.suffix().len(), 19);
}

#[test]
fn generated_ids_are_unique() {
    assert_ne!(OperationId::new(), OperationId::new());
    assert_ne!(QueueEntryId::new(), QueueEntryId::new());
}

#[test]
fn from_string_keeps_value() {
    let id = OperationId::from_string("op-abc");
    assert_eq!(id, "op-abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn suffix_without_prefix_is_whole_value() {
    let id = QueueEntryId::from_string("legacy");
    assert_eq!(id.suffix(), "legacy");
}

#[test]
fn short_truncates_suffix() {
    let id = OperationId::from_string("op-abcdefghijklmnop");
    assert_eq!(id.short(8), "abcdefgh");
    assert_eq!(OperationId::from_string("op-abc").short(8), "abc");
}

#[test]
fn name_ids_hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(AgentId::new("agent-1"), 42);
    assert_eq!(map.get("agent-1"), Some(&42));
}

#[test]
fn name_ids_serialize_transparently() {
    let json = serde_json::to_string(&AppId::new("app-9")).unwrap();
    assert_eq!(json, "\"app-9\"");
    let back: TagId = serde_json::from_str("\"servers\"").unwrap();
    assert_eq!(back, "servers");
}

#[test]
fn short_fn_on_str() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}
