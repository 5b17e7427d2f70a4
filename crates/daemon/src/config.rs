// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon settings read from `<state_dir>/config.toml`.
//!
//! Every key is optional; a missing file yields the defaults.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use fq_adapters::{StaticDirectory, StaticViews, ViewTtl};
use fq_core::{AgentId, TagId};
use fq_engine::EngineConfig;
use serde::Deserialize;
use thiserror::Error;

/// Errors reading config.toml
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("invalid config {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

/// `[queue]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSettings {
    pub sweep_interval_secs: u64,
    /// 0 removes entries on delivery instead of leasing them
    pub visibility_timeout_secs: u64,
    pub checkpoint_interval_secs: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self { sweep_interval_secs: 30, visibility_timeout_secs: 60, checkpoint_interval_secs: 60 }
    }
}

/// Parsed config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub queue: QueueSettings,
    /// TTLs for views not listed under `[views]`
    pub default_view: ViewTtl,
    pub views: BTreeMap<String, ViewTtl>,
    pub tags: BTreeMap<TagId, Vec<AgentId>>,
    pub disabled_agents: Vec<AgentId>,
}

impl Settings {
    /// Load settings, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path: path.display().to_string(), source }),
        };
        Self::parse(&text).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn directory(&self) -> StaticDirectory {
        StaticDirectory::new(
            self.tags.iter().map(|(tag, agents)| (tag.clone(), agents.clone())),
            self.disabled_agents.iter().cloned(),
        )
    }

    pub fn views(&self) -> StaticViews {
        StaticViews::new(self.views.iter().map(|(name, ttl)| (name.clone(), *ttl)))
            .with_fallback(self.default_view)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig { visibility_timeout_ms: self.queue.visibility_timeout_secs * 1000 }
    }

    /// Sweep interval, with `FQ_SWEEP_INTERVAL_MS` taking precedence.
    pub fn sweep_interval(&self) -> Duration {
        crate::env::sweep_interval()
            .unwrap_or_else(|| Duration::from_secs(self.queue.sweep_interval_secs.max(1)))
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.queue.checkpoint_interval_secs.max(1))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
