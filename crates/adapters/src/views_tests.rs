// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unlisted_view_uses_fallback() {
    let views = StaticViews::default();
    assert_eq!(views.queue_ttl("global"), ViewTtl::default());
    assert_eq!(views.queue_ttl("global").server_queue_ttl_minutes, 10);
}

#[test]
fn listed_view_overrides_fallback() {
    let short = ViewTtl { server_queue_ttl_minutes: 1, agent_queue_ttl_minutes: 2 };
    let views = StaticViews::new([("lab".to_string(), short)])
        .with_fallback(ViewTtl { server_queue_ttl_minutes: 30, agent_queue_ttl_minutes: 30 });
    assert_eq!(views.queue_ttl("lab"), short);
    assert_eq!(views.queue_ttl("prod").server_queue_ttl_minutes, 30);
}
