// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group entity (§3.1): a batch of related tasks originating from one goal.

use crate::status::GroupStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub origin: String,
    pub status: GroupStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn new(id: String, title: String, origin: String, created_by: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            origin,
            status: GroupStatus::Active,
            created_by,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = GroupStatus::Completed;
        self.completed_at = Some(now);
    }
}
