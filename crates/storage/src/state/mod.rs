// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay (§4.1).

mod groups;
mod instances;
mod tasks;
pub(crate) mod types;
mod webhooks;

pub use types::AgentMessage;

use ob_core::{Event, Group, PrefixRegistry, Task, TaskDependency, TaskUsage, Webhook, WorkerInstance};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Materialized state built by replaying the write-ahead log (§4.1 schema).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub groups: HashMap<String, Group>,
    pub tasks: HashMap<String, Task>,
    /// Dependency edges, keyed by the dependent (blocked) task's ID.
    pub task_dependencies: HashMap<String, Vec<TaskDependency>>,
    pub worker_instances: HashMap<String, WorkerInstance>,
    pub task_usage: HashMap<String, TaskUsage>,
    pub agent_messages: Vec<AgentMessage>,
    pub webhooks: HashMap<String, Webhook>,
    pub id_counters: PrefixRegistry,
    pub paused_roles: HashSet<String>,
}

impl MaterializedState {
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn get_group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn tasks_in_group(&self, group_id: &str) -> Vec<&Task> {
        self.tasks.values().filter(|t| t.group_id == group_id).collect()
    }

    /// Unresolved blockers for `task_id`.
    pub fn unresolved_blockers(&self, task_id: &str) -> Vec<&str> {
        self.task_dependencies
            .get(task_id)
            .map(|edges| edges.iter().filter(|e| !e.resolved).map(|e| e.blocked_by.as_str()).collect())
            .unwrap_or_default()
    }

    /// Tasks that list `blocker_id` among their (possibly unresolved)
    /// dependencies — the reverse edge used to cascade completion/failure.
    pub fn dependents_of(&self, blocker_id: &str) -> Vec<&str> {
        self.task_dependencies
            .iter()
            .filter(|(_, edges)| edges.iter().any(|e| e.blocked_by == blocker_id && !e.resolved))
            .map(|(task_id, _)| task_id.as_str())
            .collect()
    }

    /// Apply an event to derive state changes. All handlers must be
    /// idempotent: applying the same event twice must produce the same
    /// state as applying it once, since replay may re-run a command that
    /// was already applied for immediate visibility.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::GroupCreated { .. } | Event::GroupCompleted { .. } => groups::apply(self, event),

            Event::TaskCreated { .. }
            | Event::TaskClaimed { .. }
            | Event::TaskCompleted { .. }
            | Event::TaskFailed { .. }
            | Event::TaskRejected { .. }
            | Event::TaskCancelled { .. }
            | Event::TaskUsageRecorded { .. }
            | Event::DependencyResolved { .. } => tasks::apply(self, event),

            Event::InstanceRegistered { .. }
            | Event::InstanceStatusChanged { .. }
            | Event::InstanceHeartbeat { .. }
            | Event::RolePaused { .. }
            | Event::RoleResumed { .. }
            | Event::AgentMessage { .. } => instances::apply(self, event),

            Event::WebhookCreated { .. } | Event::WebhookDeleted { .. } | Event::WebhookTriggered { .. } => {
                webhooks::apply(self, event)
            }

            // Observational events with no persisted state of their own;
            // the Event Bus and Webhook Manager still fan them out.
            Event::AutoscaleNeeded { .. } | Event::DecisionLogged { .. } => {}
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
