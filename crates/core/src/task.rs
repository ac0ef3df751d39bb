// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entity and its invariants (§3.2).

use crate::priority::Priority;
use crate::status::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-run token/cost usage recorded against a task (§4.1 `task_usage`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub num_turns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub group_id: String,
    pub parent_id: Option<String>,
    pub revision_of: Option<String>,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub priority: Priority,
    pub assigned_to: String,
    pub claimed_by: Option<String>,
    pub status: TaskStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub output_text: Option<String>,
    pub usage: Option<TaskUsage>,
}

/// Fields required to create a task, grouped so `Board::create_task` does
/// not take a dozen positional arguments.
pub struct NewTask {
    pub group_id: String,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub assigned_to: String,
    pub priority: Priority,
    pub created_by: String,
    pub parent_id: Option<String>,
    pub revision_of: Option<String>,
    pub blocked_by: Vec<String>,
}

impl Task {
    pub fn new(id: String, fields: &NewTask, now: DateTime<Utc>) -> Self {
        let status = if fields.blocked_by.is_empty() { TaskStatus::Pending } else { TaskStatus::Blocked };
        Self {
            id,
            group_id: fields.group_id.clone(),
            parent_id: fields.parent_id.clone(),
            revision_of: fields.revision_of.clone(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            task_type: fields.task_type.clone(),
            priority: fields.priority,
            assigned_to: fields.assigned_to.clone(),
            claimed_by: None,
            status,
            created_by: fields.created_by.clone(),
            created_at: now,
            started_at: None,
            completed_at: None,
            rejection_reason: None,
            output_text: None,
            usage: None,
        }
    }

    pub fn is_claimable_by(&self, role: &str) -> bool {
        self.status == TaskStatus::Pending && self.assigned_to == role && self.claimed_by.is_none()
    }

    pub fn claim(&mut self, instance: &str, now: DateTime<Utc>) {
        self.claimed_by = Some(instance.to_string());
        self.status = TaskStatus::InProgress;
        self.started_at = Some(now);
    }

    pub fn complete(&mut self, output: Option<String>, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        self.output_text = output;
    }

    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(now);
    }

    pub fn reject(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = TaskStatus::Rejected;
        self.rejection_reason = Some(reason);
        self.completed_at = Some(now);
    }

    pub fn cancel(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = TaskStatus::Cancelled;
        self.rejection_reason = Some(reason);
        self.completed_at = Some(now);
    }

    /// §4.4.8 claim ordering key: lower sorts first.
    pub fn claim_sort_key(&self) -> (u8, DateTime<Utc>) {
        (self.priority.rank(), self.created_at)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
