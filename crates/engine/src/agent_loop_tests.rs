// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use ob_adapters::{ContextProvider, FakeAgentRunner, FakeWorktreeManager, RunOutput, RunUsage};
use ob_core::{AutoScaleConfig, FakeClock, NewTask, Priority, TaskStatus};
use ob_storage::Store;
use std::time::Duration as StdDuration;
use tempfile::tempdir;

fn role(name: &str, mode: RoutingMode, routes_to: Vec<(&str, &str)>, context_includes: Vec<ContextKind>) -> Role {
    Role {
        name: name.to_string(),
        display_name: name.to_string(),
        prefix: "CD".into(),
        can_create_groups: false,
        routes_to: routes_to.into_iter().map(|(t, r)| (t.to_string(), r.to_string())).collect(),
        context_includes,
        routing_mode: mode,
        max_instances: 4,
        auto_scale: AutoScaleConfig::default(),
        max_execution_time: None,
    }
}

struct Harness {
    board: Arc<TaskBoard>,
    instances: Arc<InstanceManager>,
    bus: Arc<EventBus>,
    runner: Arc<FakeAgentRunner>,
    clock: FakeClock,
}

fn harness() -> Harness {
    let dir = tempdir().unwrap();
    let store = Arc::new(Store::open(dir.path()).unwrap());
    Harness {
        board: Arc::new(TaskBoard::new(store.clone())),
        instances: Arc::new(InstanceManager::new(store)),
        bus: Arc::new(EventBus::new()),
        runner: Arc::new(FakeAgentRunner::new()),
        clock: FakeClock::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn loop_with(
    h: &Harness,
    role: Role,
    roles: HashMap<String, Role>,
    worktree: Option<Arc<dyn WorktreeManager>>,
    context: Option<Arc<ContextProviderRegistry<FakeClock>>>,
) -> AgentLoop<FakeClock> {
    AgentLoop::new(
        "coder-1",
        role,
        Arc::new(roles),
        h.board.clone(),
        h.instances.clone(),
        h.bus.clone(),
        h.runner.clone(),
        worktree,
        context,
        h.clock.clone(),
        tempdir().unwrap().keep(),
    )
}

fn seed_task(h: &Harness, role: &str) -> ob_core::Task {
    let now = h.clock.utc_now();
    let (group, _) = h.board.create_group("GRP", "ship it", "dashboard", "architect-1", now).unwrap();
    let fields = NewTask {
        group_id: group.id,
        title: "fix the bug".into(),
        description: "detailed repro steps".into(),
        task_type: "implement".into(),
        assigned_to: role.to_string(),
        priority: Priority::Medium,
        created_by: "architect-1".into(),
        parent_id: None,
        revision_of: None,
        blocked_by: vec![],
    };
    h.board.create_task("CD", fields, now).unwrap().0
}

#[tokio::test]
async fn start_registers_instance_and_sets_idle() {
    let h = harness();
    let lp = loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), None, None);

    lp.start().unwrap();

    assert_eq!(lp.state(), AgentLoopState::Idle);
    assert_eq!(h.instances.get("coder-1").unwrap().status, InstanceStatus::Idle);
}

#[tokio::test]
async fn run_once_with_no_claimable_task_stays_idle() {
    let h = harness();
    let lp = loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), None, None);
    lp.start().unwrap();

    lp.run_once().await.unwrap();

    assert_eq!(lp.state(), AgentLoopState::Idle);
    assert!(h.runner.calls().is_empty());
}

#[tokio::test]
async fn run_once_completes_task_on_successful_run() {
    let h = harness();
    seed_task(&h, "coder");
    h.runner.push_success(RunOutput {
        text: "patch applied".into(),
        usage: Some(RunUsage { input_tokens: 10, output_tokens: 20, cost_usd: 0.05, duration_ms: 500, num_turns: 2, ..Default::default() }),
    });

    let lp = loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), None, None);
    lp.start().unwrap();
    lp.run_once().await.unwrap();

    let board = h.board.get_board(None);
    let completed = &board[&TaskStatus::Completed][0];
    assert_eq!(completed.output_text.as_deref(), Some("patch applied"));
    assert_eq!(completed.usage.as_ref().unwrap().input_tokens, 10);
    assert_eq!(lp.state(), AgentLoopState::Idle);
}

#[tokio::test]
async fn run_once_fails_task_on_runner_error() {
    let h = harness();
    let task = seed_task(&h, "coder");
    h.runner.push_failure("agent crashed");

    let lp = loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), None, None);
    lp.start().unwrap();
    lp.run_once().await.unwrap();

    assert_eq!(h.board.get_task(&task.id).unwrap().status, TaskStatus::Failed);
}

#[tokio::test]
async fn paused_role_skips_claim_and_marks_instance_paused() {
    let h = harness();
    seed_task(&h, "coder");
    h.instances.pause_role("coder").unwrap();

    let lp = loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), None, None);
    lp.start().unwrap();
    lp.run_once().await.unwrap();

    assert_eq!(lp.state(), AgentLoopState::Paused);
    assert_eq!(h.instances.get("coder-1").unwrap().status, InstanceStatus::Paused);
    assert!(h.runner.calls().is_empty());
}

#[tokio::test]
async fn resuming_role_returns_loop_to_idle() {
    let h = harness();
    h.instances.pause_role("coder").unwrap();
    let lp = loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), None, None);
    lp.start().unwrap();
    lp.run_once().await.unwrap();
    assert_eq!(lp.state(), AgentLoopState::Paused);

    h.instances.resume_role("coder").unwrap();
    lp.run_once().await.unwrap();

    assert_eq!(lp.state(), AgentLoopState::Idle);
}

#[tokio::test]
async fn worktree_is_acquired_and_released_around_the_run() {
    let h = harness();
    seed_task(&h, "coder");
    h.runner.push_success(RunOutput { text: "ok".into(), usage: None });
    let worktree_root = tempdir().unwrap();
    let manager: Arc<dyn WorktreeManager> = Arc::new(FakeWorktreeManager::new(worktree_root.path()));

    let lp = loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), Some(manager.clone()), None);
    lp.start().unwrap();
    lp.run_once().await.unwrap();

    let calls = h.runner.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.starts_with(worktree_root.path()));
}

#[tokio::test]
async fn open_routing_mode_includes_peer_manifest_in_prompt() {
    let h = harness();
    seed_task(&h, "architect");
    h.runner.push_success(RunOutput { text: "ok".into(), usage: None });

    let mut roles = HashMap::new();
    roles.insert("coder".to_string(), role("coder", RoutingMode::Closed, vec![("implement", "coder")], vec![]));
    roles.insert(
        "architect".to_string(),
        role("architect", RoutingMode::Open, vec![], vec![]),
    );

    let lp = loop_with(&h, roles["architect"].clone(), roles, None, None);
    lp.start().unwrap();
    lp.run_once().await.unwrap();

    let prompt = &h.runner.calls()[0].0;
    assert!(prompt.contains("Peer roles:"));
    assert!(prompt.contains("coder"));
}

struct StaticProvider(&'static str, &'static str);

#[async_trait]
impl ContextProvider for StaticProvider {
    fn name(&self) -> &str {
        self.0
    }
    fn ttl_seconds(&self) -> u64 {
        60
    }
    async fn gather(&self, _scope: &str) -> Result<String, ob_adapters::AdapterError> {
        Ok(self.1.to_string())
    }
}

#[tokio::test]
async fn context_provider_output_is_folded_into_prompt() {
    let h = harness();
    seed_task(&h, "coder");
    h.runner.push_success(RunOutput { text: "ok".into(), usage: None });

    let mut registry = ContextProviderRegistry::new(h.clock.clone());
    registry.register(Arc::new(StaticProvider("recent_commits", "abc123 fix typo")));

    let lp = loop_with(
        &h,
        role("coder", RoutingMode::Closed, vec![], vec![]),
        HashMap::new(),
        None,
        Some(Arc::new(registry)),
    );
    lp.start().unwrap();
    lp.run_once().await.unwrap();

    let prompt = &h.runner.calls()[0].0;
    assert!(prompt.contains("recent_commits"));
    assert!(prompt.contains("abc123 fix typo"));
}

#[tokio::test]
async fn stop_ends_run_until_stopped() {
    let h = harness();
    let lp = Arc::new(loop_with(&h, role("coder", RoutingMode::Closed, vec![], vec![]), HashMap::new(), None, None));
    lp.start().unwrap();

    let runner_handle = {
        let lp = lp.clone();
        tokio::spawn(async move { lp.run_until_stopped(StdDuration::from_millis(5)).await })
    };
    lp.stop();
    tokio::time::timeout(StdDuration::from_secs(2), runner_handle).await.unwrap().unwrap();
    assert_eq!(lp.state(), AgentLoopState::Stopped);
}
