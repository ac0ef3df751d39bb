// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role configuration (§3.7, ADDED). Roles are constructed in code by
//! the server's composition root, never parsed from a config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    ParentArtifact,
    GroupHistory,
    SiblingTasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Can only route to the task types listed in `routes_to`.
    Closed,
    /// May route to any role by name, bypassing `routes_to`.
    Open,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScaleConfig {
    pub enabled: bool,
    pub scale_up_threshold: u32,
    pub scale_down_idle_threshold_secs: u64,
    pub cooldown_secs: u64,
}

impl Default for AutoScaleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scale_up_threshold: 1,
            scale_down_idle_threshold_secs: 300,
            cooldown_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub display_name: String,
    pub prefix: String,
    pub can_create_groups: bool,
    pub routes_to: Vec<(String, String)>,
    pub context_includes: Vec<ContextKind>,
    pub routing_mode: RoutingMode,
    pub max_instances: u32,
    pub auto_scale: AutoScaleConfig,
    #[serde(with = "duration_secs_opt")]
    pub max_execution_time: Option<Duration>,
}

impl Role {
    /// §4.5.3: resolve the downstream role for a given task type. In
    /// `open` mode a role name given directly as the task type is
    /// accepted even without a matching `routes_to` entry.
    pub fn route_for<'a>(&'a self, task_type: &'a str) -> Option<&'a str> {
        if let Some((_, role)) = self.routes_to.iter().find(|(t, _)| t == task_type) {
            return Some(role.as_str());
        }
        (self.routing_mode == RoutingMode::Open).then_some(task_type)
    }
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.as_secs()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
