// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ob_core::Priority;
use tempfile::tempdir;

fn board() -> TaskBoard {
    let dir = tempdir().unwrap();
    TaskBoard::new(Arc::new(Store::open(dir.path()).unwrap()))
}

fn new_task(group_id: &str, blocked_by: Vec<String>) -> NewTask {
    NewTask {
        group_id: group_id.to_string(),
        title: "do the thing".into(),
        description: "a longer description of the thing".into(),
        task_type: "implement".into(),
        assigned_to: "coder".into(),
        priority: Priority::Medium,
        created_by: "architect-1".into(),
        parent_id: None,
        revision_of: None,
        blocked_by,
    }
}

#[test]
fn create_group_and_task() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (task, events) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();

    assert_eq!(task.group_id, group.id);
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(events.len(), 1);
}

#[test]
fn task_with_blocker_starts_blocked() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (blocker, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    let (dependent, _) = board.create_task("CD", new_task(&group.id, vec![blocker.id.clone()]), now).unwrap();

    assert_eq!(dependent.status, TaskStatus::Blocked);
}

#[test]
fn claim_and_complete_resolves_dependent() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (blocker, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    let (dependent, _) = board.create_task("CD", new_task(&group.id, vec![blocker.id.clone()]), now).unwrap();

    let (claimed, _) = board.claim_task("coder", "coder-1", now).unwrap().unwrap();
    assert_eq!(claimed.id, blocker.id);

    let (_, events) = board.complete_task(&blocker.id, Some("done".into()), now).unwrap();
    assert!(events.iter().any(|e| matches!(e, Event::TaskCompleted { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::DependencyResolved { task_id, .. } if task_id == &dependent.id)));

    let dependent = board.get_task(&dependent.id).unwrap();
    assert_eq!(dependent.status, TaskStatus::Pending);
}

#[test]
fn completing_last_task_in_group_completes_group() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (task, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    board.claim_task("coder", "coder-1", now).unwrap();

    let (_, events) = board.complete_task(&task.id, None, now).unwrap();
    assert!(events.iter().any(|e| matches!(e, Event::GroupCompleted { .. })));

    let group = board.get_group(&group.id).unwrap();
    assert_eq!(group.status, GroupStatus::Completed);
}

#[test]
fn complete_task_rejects_non_in_progress() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (task, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();

    assert!(matches!(board.complete_task(&task.id, None, now), Err(EngineError::InvalidState(_))));
}

#[test]
fn fail_task_cascades_down_blocked_chain() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (root, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    let (mid, _) = board.create_task("CD", new_task(&group.id, vec![root.id.clone()]), now).unwrap();
    let (leaf, _) = board.create_task("CD", new_task(&group.id, vec![mid.id.clone()]), now).unwrap();

    board.claim_task("coder", "coder-1", now).unwrap();
    let (_, events) = board.fail_task(&root.id, now).unwrap();

    assert_eq!(events.iter().filter(|e| matches!(e, Event::TaskFailed { .. })).count(), 3);

    assert_eq!(board.get_task(&mid.id).unwrap().status, TaskStatus::Failed);
    assert_eq!(board.get_task(&leaf.id).unwrap().status, TaskStatus::Failed);
}

#[test]
fn reject_and_cancel_reject_already_terminal_tasks() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (task, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    board.claim_task("coder", "coder-1", now).unwrap();
    board.complete_task(&task.id, None, now).unwrap();

    assert!(matches!(board.reject_task(&task.id, "nope".into(), now), Err(EngineError::InvalidState(_))));
    assert!(matches!(board.cancel_task(&task.id, "nope".into(), now), Err(EngineError::InvalidState(_))));
}

#[test]
fn has_cycle_detects_self_and_back_edges() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (a, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    let (b, _) = board.create_task("CD", new_task(&group.id, vec![a.id.clone()]), now).unwrap();

    assert!(board.has_cycle(&a.id, &a.id));
    assert!(board.has_cycle(&a.id, &b.id));
    assert!(!board.has_cycle(&b.id, &a.id));
}

#[test]
fn get_board_groups_by_status_and_filters_by_role() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let mut coder_task = new_task(&group.id, vec![]);
    coder_task.assigned_to = "coder".into();
    board.create_task("CD", coder_task, now).unwrap();
    let mut reviewer_task = new_task(&group.id, vec![]);
    reviewer_task.assigned_to = "reviewer".into();
    board.create_task("RV", reviewer_task, now).unwrap();

    let all = board.get_board(None);
    assert_eq!(all.get(&TaskStatus::Pending).map(Vec::len), Some(2));

    let coder_only = board.get_board(Some("coder"));
    assert_eq!(coder_only.get(&TaskStatus::Pending).map(Vec::len), Some(1));
}

#[test]
fn search_tasks_matches_title_case_insensitively() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let mut task = new_task(&group.id, vec![]);
    task.title = "Fix the Frobnicator".into();
    board.create_task("CD", task, now).unwrap();

    let result = board.search_tasks("frobnicator", None);
    assert_eq!(result.total, 1);

    let miss = board.search_tasks("nonexistent", None);
    assert_eq!(miss.total, 0);
}

#[test]
fn recover_stuck_blocked_task_falls_through_to_pending_when_all_blockers_complete() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (blocker, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    let (dependent, _) = board.create_task("CD", new_task(&group.id, vec![blocker.id.clone()]), now).unwrap();

    board.claim_task("coder", "coder-1", now).unwrap();
    // Simulate a crash between TaskCompleted and DependencyResolved: append
    // TaskCompleted directly, bypassing the Board's own dependency cascade.
    board.store.append(Event::TaskCompleted { task_id: blocker.id.clone(), output_text: None, at: now }).unwrap();
    assert_eq!(board.get_task(&dependent.id).unwrap().status, TaskStatus::Blocked);

    let recovered = board.recover_stuck_blocked_tasks(now).unwrap();
    assert_eq!(recovered.len(), 1);
    assert_eq!(board.get_task(&dependent.id).unwrap().status, TaskStatus::Pending);
}

#[test]
fn recover_stuck_blocked_task_cascades_failure_when_a_blocker_failed() {
    let board = board();
    let now = Utc::now();
    let (group, _) = board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let (blocker, _) = board.create_task("CD", new_task(&group.id, vec![]), now).unwrap();
    let (dependent, _) = board.create_task("CD", new_task(&group.id, vec![blocker.id.clone()]), now).unwrap();

    board.claim_task("coder", "coder-1", now).unwrap();
    board.store.append(Event::TaskFailed { task_id: blocker.id.clone(), at: now }).unwrap();

    let recovered = board.recover_stuck_blocked_tasks(now).unwrap();
    assert_eq!(recovered.len(), 1);
    assert_eq!(board.get_task(&dependent.id).unwrap().status, TaskStatus::Failed);
}
