// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The system-wide event enum (§4.2, §4.4). Every durable state change
//! is represented as one of these before it is appended to the write-ahead
//! log; the same values are fanned out on the Event Bus after being
//! applied, using `name()` as the bus pattern to match against.

use crate::priority::Priority;
use crate::status::InstanceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    GroupCreated {
        group_id: String,
        title: String,
        origin: String,
        created_by: String,
        at: DateTime<Utc>,
    },
    GroupCompleted {
        group_id: String,
        at: DateTime<Utc>,
    },
    TaskCreated {
        task_id: String,
        group_id: String,
        parent_id: Option<String>,
        revision_of: Option<String>,
        title: String,
        description: String,
        task_type: String,
        priority: Priority,
        assigned_to: String,
        created_by: String,
        blocked_by: Vec<String>,
        at: DateTime<Utc>,
    },
    TaskClaimed {
        task_id: String,
        instance_id: String,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: String,
        output_text: Option<String>,
        at: DateTime<Utc>,
    },
    TaskFailed {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskRejected {
        task_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    TaskCancelled {
        task_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    TaskUsageRecorded {
        task_id: String,
        input_tokens: u64,
        output_tokens: u64,
        cost_usd: f64,
        duration_ms: u64,
        num_turns: u32,
    },
    DependencyResolved {
        task_id: String,
        blocked_by: String,
        at: DateTime<Utc>,
    },
    InstanceRegistered {
        instance_id: String,
        role: String,
        at: DateTime<Utc>,
    },
    InstanceStatusChanged {
        instance_id: String,
        status: InstanceStatus,
        current_task_id: Option<String>,
        at: DateTime<Utc>,
    },
    InstanceHeartbeat {
        instance_id: String,
        at: DateTime<Utc>,
    },
    RolePaused {
        role: String,
    },
    RoleResumed {
        role: String,
    },
    AgentMessage {
        instance_id: String,
        task_id: Option<String>,
        text: String,
        at: DateTime<Utc>,
    },
    AutoscaleNeeded {
        role: String,
        pending_count: u32,
        at: DateTime<Utc>,
    },
    DecisionLogged {
        task_id: Option<String>,
        summary: String,
        at: DateTime<Utc>,
    },
    WebhookCreated {
        webhook_id: String,
        url: String,
        events: Vec<String>,
        secret: Option<String>,
        at: DateTime<Utc>,
    },
    WebhookDeleted {
        webhook_id: String,
    },
    WebhookTriggered {
        webhook_id: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The dotted event-bus name this event is fanned out under (§4.2's
    /// canonical event names).
    pub fn name(&self) -> &'static str {
        match self {
            Event::GroupCreated { .. } => "group.created",
            Event::GroupCompleted { .. } => "group.completed",
            Event::TaskCreated { .. } => "task.created",
            Event::TaskClaimed { .. } => "task.claimed",
            Event::TaskCompleted { .. } => "task.completed",
            Event::TaskFailed { .. } => "task.failed",
            Event::TaskRejected { .. } => "task.rejected",
            Event::TaskCancelled { .. } => "task.cancelled",
            Event::TaskUsageRecorded { .. } => "task.usage_recorded",
            Event::DependencyResolved { .. } => "task.dependency_resolved",
            Event::InstanceRegistered { .. } => "agent.registered",
            Event::InstanceStatusChanged { .. } => "agent.status_changed",
            Event::InstanceHeartbeat { .. } => "agent.heartbeat",
            Event::RolePaused { .. } => "agent.role_paused",
            Event::RoleResumed { .. } => "agent.role_resumed",
            Event::AgentMessage { .. } => "agent.message",
            Event::AutoscaleNeeded { .. } => "autoscale.needed",
            Event::DecisionLogged { .. } => "decision.logged",
            Event::WebhookCreated { .. } => "webhook.created",
            Event::WebhookDeleted { .. } => "webhook.deleted",
            Event::WebhookTriggered { .. } => "webhook.triggered",
        }
    }

    /// Whether `pattern` (as registered via `EventBus::subscribe`) matches
    /// this event, per the `"*"` wildcard rule.
    pub fn matches(&self, pattern: &str) -> bool {
        pattern == "*" || pattern == self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_stable_dotted_string() {
        let e = Event::TaskClaimed { task_id: "CD-001".into(), instance_id: "coder-1".into(), at: Utc::now() };
        assert_eq!(e.name(), "task.claimed");
    }

    #[test]
    fn wildcard_matches_everything() {
        let e = Event::TaskFailed { task_id: "CD-001".into(), at: Utc::now() };
        assert!(e.matches("*"));
        assert!(e.matches("task.failed"));
        assert!(!e.matches("task.completed"));
    }

    #[test]
    fn roundtrips_through_tagged_json() {
        let e = Event::RolePaused { role: "coder".into() };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"role_paused\""));
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, e);
    }
}
