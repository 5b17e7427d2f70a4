// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filtering and paging for operation listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::id::{AgentId, TagId};
use crate::operation::Operation;

/// Page size when a listing names none
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Field operations are ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Action,
    Status,
    #[default]
    CreatedAt,
    UpdatedAt,
    CompletedAt,
    CreatedBy,
}

crate::simple_display! {
    SortKey {
        Action => "action",
        Status => "status",
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
        CompletedAt => "completed_at",
        CreatedBy => "created_by",
    }
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Action,
        SortKey::Status,
        SortKey::CreatedAt,
        SortKey::UpdatedAt,
        SortKey::CompletedAt,
        SortKey::CreatedBy,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.to_string() == s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

crate::simple_display! {
    SortOrder {
        Asc => "asc",
        Desc => "desc",
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Which operations a listing returns, and in what order.
///
/// Every filter that is set must match. `agent_id` matches operations that
/// have a tracker row for that agent, so it is applied by the caller that
/// owns the tracker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<TagId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default)]
    pub sort_key: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default = "default_page_size")]
    pub count: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for OperationFilter {
    fn default() -> Self {
        Self {
            view_name: None,
            agent_id: None,
            tag_id: None,
            action: None,
            sort_key: SortKey::default(),
            order: SortOrder::default(),
            count: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl OperationFilter {
    crate::setters! {
        set { sort_key: SortKey, order: SortOrder, count: usize, offset: usize }
        option { view_name: String, agent_id: AgentId, tag_id: TagId, action: Action }
    }

    /// Whether the ledger row passes every set filter other than the agent.
    pub fn matches(&self, op: &Operation) -> bool {
        self.view_name.as_ref().is_none_or(|view| op.view_name == *view)
            && self.tag_id.as_ref().is_none_or(|tag| op.tag_id.as_ref() == Some(tag))
            && self.action.is_none_or(|action| op.action == action)
    }

    /// Order two rows by the sort key, falling back to the id for ties.
    pub fn compare(&self, a: &Operation, b: &Operation) -> Ordering {
        let by_key = match self.sort_key {
            SortKey::Action => a.action.to_string().cmp(&b.action.to_string()),
            SortKey::Status => a.status.to_string().cmp(&b.status.to_string()),
            SortKey::CreatedAt => a.created_at_ms.cmp(&b.created_at_ms),
            SortKey::UpdatedAt => a.updated_at_ms.cmp(&b.updated_at_ms),
            SortKey::CompletedAt => a.completed_at_ms.cmp(&b.completed_at_ms),
            SortKey::CreatedBy => a.created_by.cmp(&b.created_by),
        };
        let by_key = match self.order {
            SortOrder::Asc => by_key,
            SortOrder::Desc => by_key.reverse(),
        };
        by_key.then_with(|| a.id.cmp(&b.id))
    }

    /// Apply the offset and page size to sorted rows.
    pub fn page<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter().skip(self.offset).take(self.count).collect()
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
