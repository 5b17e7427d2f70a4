// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent and tag membership lookups owned by the tenancy service.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use fq_core::{AgentId, TagId};
use thiserror::Error;

/// Errors from directory lookups
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("unknown tag: {0}")]
    UnknownTag(TagId),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Resolves dispatch targets
#[async_trait]
pub trait TargetDirectory: Clone + Send + Sync + 'static {
    /// Agents that are members of a tag
    async fn resolve_tag(&self, tag_id: &TagId) -> Result<Vec<AgentId>, DirectoryError>;

    /// Whether an agent may receive work
    async fn is_enabled(&self, agent_id: &AgentId) -> Result<bool, DirectoryError>;
}

/// Directory backed by a fixed tag table and disabled-agent list.
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    tags: HashMap<TagId, Vec<AgentId>>,
    disabled: HashSet<AgentId>,
}

impl StaticDirectory {
    pub fn new(
        tags: impl IntoIterator<Item = (TagId, Vec<AgentId>)>,
        disabled: impl IntoIterator<Item = AgentId>,
    ) -> Self {
        Self { tags: tags.into_iter().collect(), disabled: disabled.into_iter().collect() }
    }
}

#[async_trait]
impl TargetDirectory for StaticDirectory {
    async fn resolve_tag(&self, tag_id: &TagId) -> Result<Vec<AgentId>, DirectoryError> {
        self.tags.get(tag_id).cloned().ok_or_else(|| DirectoryError::UnknownTag(tag_id.clone()))
    }

    async fn is_enabled(&self, agent_id: &AgentId) -> Result<bool, DirectoryError> {
        Ok(!self.disabled.contains(agent_id))
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{DirectoryError, TargetDirectory};
    use async_trait::async_trait;
    use fq_core::{AgentId, TagId};
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeDirectoryState {
        tags: HashMap<TagId, Vec<AgentId>>,
        disabled: HashSet<AgentId>,
        unavailable: bool,
    }

    /// Fake directory whose membership tests can change at runtime
    #[derive(Clone, Default)]
    pub struct FakeDirectory {
        inner: Arc<Mutex<FakeDirectoryState>>,
    }

    impl FakeDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_tag(&self, tag: &str, agents: &[&str]) {
            self.inner
                .lock()
                .tags
                .insert(TagId::new(tag), agents.iter().map(|a| AgentId::new(*a)).collect());
        }

        pub fn disable(&self, agent: &str) {
            self.inner.lock().disabled.insert(AgentId::new(agent));
        }

        pub fn enable(&self, agent: &str) {
            self.inner.lock().disabled.remove(agent);
        }

        /// Make every lookup fail
        pub fn set_unavailable(&self, unavailable: bool) {
            self.inner.lock().unavailable = unavailable;
        }
    }

    #[async_trait]
    impl TargetDirectory for FakeDirectory {
        async fn resolve_tag(&self, tag_id: &TagId) -> Result<Vec<AgentId>, DirectoryError> {
            let inner = self.inner.lock();
            if inner.unavailable {
                return Err(DirectoryError::Unavailable("fake".to_string()));
            }
            inner.tags.get(tag_id).cloned().ok_or_else(|| DirectoryError::UnknownTag(tag_id.clone()))
        }

        async fn is_enabled(&self, agent_id: &AgentId) -> Result<bool, DirectoryError> {
            let inner = self.inner.lock();
            if inner.unavailable {
                return Err(DirectoryError::Unavailable("fake".to_string()));
            }
            Ok(!inner.disabled.contains(agent_id))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDirectory;

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
