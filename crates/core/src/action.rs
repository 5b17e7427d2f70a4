// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actions an operation can request of an agent, and the plugin namespaces
//! they belong to.

use serde::{Deserialize, Serialize};

use crate::id::AgentId;

/// The unit of work an operation asks agents to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Reboot,
    Shutdown,
    InstallOsApps,
    InstallCustomApps,
    InstallSupportedApps,
    InstallAgentUpdate,
    Uninstall,
    UninstallAgent,
    RefreshApps,
}

crate::simple_display! {
    Action {
        Reboot => "reboot",
        Shutdown => "shutdown",
        InstallOsApps => "install_os_apps",
        InstallCustomApps => "install_custom_apps",
        InstallSupportedApps => "install_supported_apps",
        InstallAgentUpdate => "install_agent_update",
        Uninstall => "uninstall",
        UninstallAgent => "uninstall_agent",
        RefreshApps => "refresh_apps",
    }
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Reboot,
        Action::Shutdown,
        Action::InstallOsApps,
        Action::InstallCustomApps,
        Action::InstallSupportedApps,
        Action::InstallAgentUpdate,
        Action::Uninstall,
        Action::UninstallAgent,
        Action::RefreshApps,
    ];

    /// Parse the wire name of an action.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.to_string() == s)
    }

    /// Whether results are reported per application rather than per agent.
    pub fn is_app_scoped(&self) -> bool {
        matches!(
            self,
            Action::InstallOsApps
                | Action::InstallCustomApps
                | Action::InstallSupportedApps
                | Action::InstallAgentUpdate
                | Action::Uninstall
        )
    }

    /// Plugin an action is filed under when the caller does not say.
    pub fn default_plugin(&self) -> Plugin {
        match self {
            Action::Reboot | Action::Shutdown => Plugin::Core,
            _ => Plugin::Patching,
        }
    }

    /// Path (relative to the agent's listener base) the agent reports results to.
    fn result_path(&self) -> &'static str {
        match self {
            Action::Reboot => "core/results/reboot",
            Action::Shutdown => "core/results/shutdown",
            Action::InstallOsApps => "apps/results/install/os",
            Action::InstallCustomApps => "apps/results/install/custom",
            Action::InstallSupportedApps => "apps/results/install/supported",
            Action::InstallAgentUpdate => "apps/results/install/agent",
            Action::Uninstall | Action::UninstallAgent => "apps/results/uninstall",
            Action::RefreshApps => "apps/results/refresh_apps",
        }
    }

    /// Method and URI the agent must call back with its result.
    pub fn result_callback(&self, agent_id: &AgentId) -> (RequestMethod, String) {
        (RequestMethod::Put, format!("rvl/v2/{}/{}", agent_id, self.result_path()))
    }
}

/// Namespace an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plugin {
    Core,
    Patching,
    RemoteAccess,
    Monitoring,
}

crate::simple_display! {
    Plugin {
        Core => "core",
        Patching => "patching",
        RemoteAccess => "remote_access",
        Monitoring => "monitoring",
    }
}

impl Plugin {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "core" => Some(Plugin::Core),
            "patching" => Some(Plugin::Patching),
            "remote_access" | "ra" => Some(Plugin::RemoteAccess),
            "monitoring" => Some(Plugin::Monitoring),
            _ => None,
        }
    }
}

/// What the operation was addressed to by its creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformedOn {
    Agent,
    Tag,
}

crate::simple_display! {
    PerformedOn {
        Agent => "agent",
        Tag => "tag",
    }
}

/// HTTP method an agent uses for its result callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Put,
}

crate::simple_display! {
    RequestMethod {
        Get => "GET",
        Post => "POST",
        Put => "PUT",
    }
}

/// CPU priority the agent should run the work at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuThrottle {
    Idle,
    BelowNormal,
    #[default]
    Normal,
    AboveNormal,
    High,
}

/// Whether the agent should restart after the work completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    #[default]
    None,
    Needed,
    Forced,
}

/// Resource policy handed to the agent alongside the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Throttle {
    #[serde(default)]
    pub cpu_throttle: CpuThrottle,
    /// Network cap in KB/s; 0 means unthrottled
    #[serde(default)]
    pub net_throttle: u32,
    #[serde(default)]
    pub restart: RestartPolicy,
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
