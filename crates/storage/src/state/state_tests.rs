// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ob_core::Priority;
use chrono::Utc;

fn group_created(group_id: &str) -> Event {
    Event::GroupCreated {
        group_id: group_id.into(),
        title: "t".into(),
        origin: "o".into(),
        created_by: "pm".into(),
        at: Utc::now(),
    }
}

fn task_created(task_id: &str, group_id: &str, blocked_by: Vec<String>) -> Event {
    Event::TaskCreated {
        task_id: task_id.into(),
        group_id: group_id.into(),
        parent_id: None,
        revision_of: None,
        title: "t".into(),
        description: "".into(),
        task_type: "impl".into(),
        priority: Priority::Medium,
        assigned_to: "coder".into(),
        created_by: "pm".into(),
        blocked_by,
        at: Utc::now(),
    }
}

#[test]
fn group_created_is_idempotent() {
    let mut state = MaterializedState::default();
    let event = group_created("FEAT-001");
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.groups.len(), 1);
}

#[test]
fn task_created_with_blockers_registers_dependency_edges() {
    let mut state = MaterializedState::default();
    state.apply_event(&task_created("CD-001", "FEAT-001", vec![]));
    state.apply_event(&task_created("CD-002", "FEAT-001", vec!["CD-001".into()]));

    assert_eq!(state.unresolved_blockers("CD-002"), vec!["CD-001"]);
    assert_eq!(state.tasks["CD-002"].status, ob_core::TaskStatus::Blocked);
}

#[test]
fn dependency_resolved_unblocks_task_when_no_blockers_remain() {
    let mut state = MaterializedState::default();
    state.apply_event(&task_created("CD-001", "FEAT-001", vec![]));
    state.apply_event(&task_created("CD-002", "FEAT-001", vec!["CD-001".into()]));

    state.apply_event(&Event::DependencyResolved { task_id: "CD-002".into(), blocked_by: "CD-001".into(), at: Utc::now() });

    assert!(state.unresolved_blockers("CD-002").is_empty());
    assert_eq!(state.tasks["CD-002"].status, ob_core::TaskStatus::Pending);
}

#[test]
fn dependents_of_finds_reverse_edge() {
    let mut state = MaterializedState::default();
    state.apply_event(&task_created("CD-001", "FEAT-001", vec![]));
    state.apply_event(&task_created("CD-002", "FEAT-001", vec!["CD-001".into()]));
    state.apply_event(&task_created("CD-003", "FEAT-001", vec!["CD-001".into()]));

    let mut dependents = state.dependents_of("CD-001");
    dependents.sort();
    assert_eq!(dependents, vec!["CD-002", "CD-003"]);
}

#[test]
fn task_claim_and_complete_are_idempotent_under_replay() {
    let mut state = MaterializedState::default();
    state.apply_event(&task_created("CD-001", "FEAT-001", vec![]));

    let claimed = Event::TaskClaimed { task_id: "CD-001".into(), instance_id: "coder-1".into(), at: Utc::now() };
    state.apply_event(&claimed);
    state.apply_event(&claimed);
    assert_eq!(state.tasks["CD-001"].claimed_by.as_deref(), Some("coder-1"));

    let completed = Event::TaskCompleted { task_id: "CD-001".into(), output_text: Some("done".into()), at: Utc::now() };
    state.apply_event(&completed);
    state.apply_event(&completed);
    assert_eq!(state.tasks["CD-001"].status, ob_core::TaskStatus::Completed);
}

#[test]
fn role_pause_and_resume_toggle_paused_set() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::RolePaused { role: "coder".into() });
    assert!(state.paused_roles.contains("coder"));

    state.apply_event(&Event::RoleResumed { role: "coder".into() });
    assert!(!state.paused_roles.contains("coder"));
}
