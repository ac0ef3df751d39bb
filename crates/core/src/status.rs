// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status enums for groups and tasks (§3.1, §3.2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Active,
    Completed,
    Archived,
}

crate::simple_display! {
    GroupStatus {
        Active => "active",
        Completed => "completed",
        Archived => "archived",
    }
}

/// Task status. `Blocked` and `Pending` are both "not yet claimable or
/// claimable" states distinguished by unresolved dependency edges (§4.4.3);
/// the rest are set by the Board's command methods (§4.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Blocked,
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Rejected,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled | TaskStatus::Rejected
        )
    }
}

crate::simple_display! {
    TaskStatus {
        Blocked => "blocked",
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Rejected => "rejected",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Idle,
    Working,
    Paused,
    Offline,
}

crate::simple_display! {
    InstanceStatus {
        Idle => "idle",
        Working => "working",
        Paused => "paused",
        Offline => "offline",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
