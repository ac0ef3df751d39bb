// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    completed = { TaskStatus::Completed, true },
    failed    = { TaskStatus::Failed,    true },
    cancelled = { TaskStatus::Cancelled, true },
    rejected  = { TaskStatus::Rejected,  true },
    pending   = { TaskStatus::Pending,   false },
    blocked   = { TaskStatus::Blocked,   false },
    running   = { TaskStatus::InProgress, false },
)]
fn terminal_iff_expected(status: TaskStatus, expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[test]
fn task_status_display() {
    assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
    assert_eq!(TaskStatus::Blocked.to_string(), "blocked");
}

#[test]
fn group_and_instance_status_roundtrip() {
    for s in [GroupStatus::Active, GroupStatus::Completed, GroupStatus::Archived] {
        let json = serde_json::to_string(&s).unwrap();
        let parsed: GroupStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(s, parsed);
    }
    for s in [InstanceStatus::Idle, InstanceStatus::Working, InstanceStatus::Paused, InstanceStatus::Offline] {
        let json = serde_json::to_string(&s).unwrap();
        let parsed: InstanceStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(s, parsed);
    }
}
