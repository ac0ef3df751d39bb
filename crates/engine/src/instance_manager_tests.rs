// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ob_storage::Store;
use tempfile::tempdir;

fn manager() -> InstanceManager {
    let dir = tempdir().unwrap();
    InstanceManager::new(Arc::new(Store::open(dir.path()).unwrap()))
}

#[test]
fn register_creates_idle_instance() {
    let mgr = manager();
    let now = Utc::now();
    let instance = mgr.register("coder-1", "coder", now).unwrap();
    assert_eq!(instance.role, "coder");
    assert_eq!(instance.status, InstanceStatus::Idle);
}

#[test]
fn update_status_sets_current_task() {
    let mgr = manager();
    let now = Utc::now();
    mgr.register("coder-1", "coder", now).unwrap();

    let instance = mgr.update_status("coder-1", InstanceStatus::Working, Some("CD-001".into()), now).unwrap();
    assert_eq!(instance.status, InstanceStatus::Working);
    assert_eq!(instance.current_task_id.as_deref(), Some("CD-001"));
}

#[test]
fn heartbeat_updates_last_heartbeat() {
    let mgr = manager();
    let now = Utc::now();
    mgr.register("coder-1", "coder", now).unwrap();

    let later = now + chrono::Duration::seconds(30);
    mgr.heartbeat("coder-1", later).unwrap();

    assert_eq!(mgr.get("coder-1").unwrap().last_heartbeat, later);
}

#[test]
fn pause_and_resume_role_toggle_is_role_paused() {
    let mgr = manager();
    assert!(!mgr.is_role_paused("coder"));

    mgr.pause_role("coder").unwrap();
    assert!(mgr.is_role_paused("coder"));

    mgr.resume_role("coder").unwrap();
    assert!(!mgr.is_role_paused("coder"));
}

#[test]
fn get_instances_by_role_filters_correctly() {
    let mgr = manager();
    let now = Utc::now();
    mgr.register("coder-1", "coder", now).unwrap();
    mgr.register("coder-2", "coder", now).unwrap();
    mgr.register("architect-1", "architect", now).unwrap();

    assert_eq!(mgr.get_instances_by_role("coder").len(), 2);
    assert_eq!(mgr.get_instances_by_role("architect").len(), 1);
}

#[test]
fn suspect_instances_finds_stale_heartbeats() {
    let mgr = manager();
    let now = Utc::now();
    mgr.register("coder-1", "coder", now).unwrap();

    let much_later = now + chrono::Duration::minutes(15);
    let suspects = mgr.suspect_instances("coder", much_later, chrono::Duration::minutes(10));
    assert_eq!(suspects.len(), 1);
    assert_eq!(suspects[0].id, "coder-1");
}

#[test]
fn get_unknown_instance_is_not_found() {
    let mgr = manager();
    assert!(matches!(mgr.get("ghost"), Err(EngineError::NotFound(_))));
}
