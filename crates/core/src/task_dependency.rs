// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency edges between tasks (§3.3): `task_id` is blocked by
//! `blocked_by` until that task reaches a terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDependency {
    pub task_id: String,
    pub blocked_by: String,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TaskDependency {
    pub fn new(task_id: String, blocked_by: String) -> Self {
        Self { task_id, blocked_by, resolved: false, resolved_at: None }
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) {
        self.resolved = true;
        self.resolved_at = Some(now);
    }
}
