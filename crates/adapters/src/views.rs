// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-view queue TTL defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default server-side queue TTL, in minutes
pub const DEFAULT_SERVER_TTL_MINUTES: u64 = 10;
/// Default extra time granted to agents past the server TTL, in minutes
pub const DEFAULT_AGENT_TTL_MINUTES: u64 = 10;

/// Queue TTLs configured for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTtl {
    #[serde(default = "default_server")]
    pub server_queue_ttl_minutes: u64,
    #[serde(default = "default_agent")]
    pub agent_queue_ttl_minutes: u64,
}

fn default_server() -> u64 {
    DEFAULT_SERVER_TTL_MINUTES
}

fn default_agent() -> u64 {
    DEFAULT_AGENT_TTL_MINUTES
}

impl Default for ViewTtl {
    fn default() -> Self {
        Self {
            server_queue_ttl_minutes: DEFAULT_SERVER_TTL_MINUTES,
            agent_queue_ttl_minutes: DEFAULT_AGENT_TTL_MINUTES,
        }
    }
}

/// Source of per-view settings
pub trait ViewSettings: Clone + Send + Sync + 'static {
    fn queue_ttl(&self, view_name: &str) -> ViewTtl;
}

/// Settings from configuration, falling back to a default for unlisted views.
#[derive(Clone, Debug, Default)]
pub struct StaticViews {
    fallback: ViewTtl,
    views: HashMap<String, ViewTtl>,
}

impl StaticViews {
    pub fn new(views: impl IntoIterator<Item = (String, ViewTtl)>) -> Self {
        Self { fallback: ViewTtl::default(), views: views.into_iter().collect() }
    }

    pub fn with_fallback(mut self, fallback: ViewTtl) -> Self {
        self.fallback = fallback;
        self
    }
}

impl ViewSettings for StaticViews {
    fn queue_ttl(&self, view_name: &str) -> ViewTtl {
        self.views.get(view_name).copied().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
#[path = "views_tests.rs"]
mod tests;
