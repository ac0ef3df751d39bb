// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker instance entity (§3.4): one running agent loop for a role.

use crate::status::InstanceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInstance {
    pub id: String,
    pub role: String,
    pub status: InstanceStatus,
    pub current_task_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
}

impl WorkerInstance {
    pub fn new(id: String, role: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            role,
            status: InstanceStatus::Idle,
            current_task_id: None,
            started_at: now,
            last_heartbeat: now,
        }
    }

    pub fn heartbeat(&mut self, now: DateTime<Utc>) {
        self.last_heartbeat = now;
    }

    pub fn start_working(&mut self, task_id: String, now: DateTime<Utc>) {
        self.status = InstanceStatus::Working;
        self.current_task_id = Some(task_id);
        self.last_heartbeat = now;
    }

    pub fn go_idle(&mut self, now: DateTime<Utc>) {
        self.status = InstanceStatus::Idle;
        self.current_task_id = None;
        self.last_heartbeat = now;
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.status = InstanceStatus::Paused;
        self.last_heartbeat = now;
    }

    pub fn go_offline(&mut self, now: DateTime<Utc>) {
        self.status = InstanceStatus::Offline;
        self.last_heartbeat = now;
    }

    /// §4.6 idle-threshold policy: an instance is eligible for scale-down
    /// once it has been idle continuously for at least `idle_for`.
    pub fn idle_duration(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        (self.status == InstanceStatus::Idle).then(|| now - self.last_heartbeat)
    }
}
