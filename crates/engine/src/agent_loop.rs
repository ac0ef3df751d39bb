// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Loop (§4.5): drives a single worker instance through its
//! lifecycle — claim, prompt assembly, run, persist, repeat.

use ob_adapters::{AgentRunner, ContextProviderRegistry, WorktreeManager};
use ob_core::{Clock, ContextKind, Event, InstanceStatus, Role, RoutingMode, Task, TaskUsage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::EngineError;
use crate::event_bus::EventBus;
use crate::instance_manager::InstanceManager;
use crate::task_board::TaskBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentLoopState {
    Starting,
    Idle,
    Working,
    Paused,
    Stopped,
}

/// Drives one worker instance (§4.5.1's state machine plus the `run_once`
/// cycle of §4.5.2). Generic over `Clock` only; the Agent Runner and
/// Worktree Manager are held as trait objects since nothing else here
/// depends on their concrete type.
pub struct AgentLoop<C: Clock> {
    instance_id: String,
    role: Role,
    roles: Arc<HashMap<String, Role>>,
    board: Arc<TaskBoard>,
    instances: Arc<InstanceManager>,
    bus: Arc<EventBus>,
    runner: Arc<dyn AgentRunner>,
    worktree: Option<Arc<dyn WorktreeManager>>,
    context: Option<Arc<ContextProviderRegistry<C>>>,
    clock: C,
    working_dir: PathBuf,
    state: Mutex<AgentLoopState>,
}

#[allow(clippy::too_many_arguments)]
impl<C: Clock> AgentLoop<C> {
    pub fn new(
        instance_id: impl Into<String>,
        role: Role,
        roles: Arc<HashMap<String, Role>>,
        board: Arc<TaskBoard>,
        instances: Arc<InstanceManager>,
        bus: Arc<EventBus>,
        runner: Arc<dyn AgentRunner>,
        worktree: Option<Arc<dyn WorktreeManager>>,
        context: Option<Arc<ContextProviderRegistry<C>>>,
        clock: C,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            role,
            roles,
            board,
            instances,
            bus,
            runner,
            worktree,
            context,
            clock,
            working_dir,
            state: Mutex::new(AgentLoopState::Starting),
        }
    }

    pub fn state(&self) -> AgentLoopState {
        *self.state.lock()
    }

    pub fn stop(&self) {
        *self.state.lock() = AgentLoopState::Stopped;
    }

    /// §4.5.1 `starting -> idle`: registers the instance and makes it
    /// eligible to claim work.
    pub fn start(&self) -> Result<(), EngineError> {
        let now = self.clock.utc_now();
        self.instances.register(&self.instance_id, &self.role.name, now)?;
        *self.state.lock() = AgentLoopState::Idle;
        self.bus.emit(Event::InstanceStatusChanged {
            instance_id: self.instance_id.clone(),
            status: InstanceStatus::Idle,
            current_task_id: None,
            at: now,
        });
        Ok(())
    }

    /// §4.5.2: one pass of the loop. Returns once the role-pause check,
    /// claim attempt, and (if a task was claimed) its full run have been
    /// handled. Errors here are the "run_once itself raised" case of
    /// §4.5.6; the caller (`run_until_stopped`) is responsible for the
    /// outer-loop recovery.
    pub async fn run_once(&self) -> Result<(), EngineError> {
        if self.instances.is_role_paused(&self.role.name) {
            if self.state() != AgentLoopState::Paused {
                *self.state.lock() = AgentLoopState::Paused;
                self.set_status(InstanceStatus::Paused, None)?;
            }
            return Ok(());
        }
        if self.state() == AgentLoopState::Paused {
            *self.state.lock() = AgentLoopState::Idle;
            self.set_status(InstanceStatus::Idle, None)?;
        }

        let now = self.clock.utc_now();
        let Some((task, claimed)) = self.board.claim_task(&self.role.name, &self.instance_id, now)? else {
            return Ok(());
        };

        *self.state.lock() = AgentLoopState::Working;
        self.set_status(InstanceStatus::Working, Some(task.id.clone()))?;
        self.bus.emit(claimed);

        self.run_claimed_task(task).await?;

        *self.state.lock() = AgentLoopState::Idle;
        self.set_status(InstanceStatus::Idle, None)?;
        self.instances.heartbeat(&self.instance_id, self.clock.utc_now())?;
        Ok(())
    }

    async fn run_claimed_task(&self, task: Task) -> Result<(), EngineError> {
        let worktree = match &self.worktree {
            Some(manager) => Some(manager.acquire(&task.id).await.map_err(EngineError::Adapter)?),
            None => None,
        };
        let cwd = worktree.as_ref().map(|w| w.path.clone()).unwrap_or_else(|| self.working_dir.clone());

        let prompt = self.build_prompt(&task).await;
        let outcome = self.runner.run(&prompt, &cwd).await;

        if let (Some(manager), Some(worktree)) = (&self.worktree, worktree) {
            let branch = worktree.branch.clone();
            if let Err(e) = manager.release(worktree).await {
                tracing::warn!(task_id = %task.id, branch, error = %e, "worktree release failed (best-effort)");
            }
        }

        let now = self.clock.utc_now();
        match outcome {
            Ok(output) => {
                if let Some(usage) = output.usage {
                    let usage = TaskUsage {
                        input_tokens: usage.input_tokens,
                        output_tokens: usage.output_tokens,
                        cost_usd: usage.cost_usd,
                        duration_ms: usage.duration_ms,
                        num_turns: usage.num_turns,
                    };
                    let event = self.board.record_task_usage(&task.id, usage)?;
                    self.bus.emit(event);
                }
                let (_, events) = self.board.complete_task(&task.id, Some(output.text), now)?;
                for event in events {
                    self.bus.emit(event);
                }
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "agent run failed, failing task");
                let (_, events) = self.board.fail_task(&task.id, now)?;
                for event in events {
                    self.bus.emit(event);
                }
            }
        }
        Ok(())
    }

    fn set_status(&self, status: InstanceStatus, current_task_id: Option<String>) -> Result<(), EngineError> {
        let now = self.clock.utc_now();
        self.instances.update_status(&self.instance_id, status, current_task_id.clone(), now)?;
        self.bus.emit(Event::InstanceStatusChanged {
            instance_id: self.instance_id.clone(),
            status,
            current_task_id,
            at: now,
        });
        Ok(())
    }

    /// §4.5.3: deterministic prompt assembly.
    async fn build_prompt(&self, task: &Task) -> String {
        let mut sections = vec![
            format!("Instance: {} ({})", self.instance_id, self.role.display_name),
            format!("Task: {} [{}] priority={} group={}", task.id, task.task_type, task.priority, task.group_id),
            format!("Title: {}", task.title),
            format!("Description:\n{}", task.description),
        ];

        if self.role.context_includes.contains(&ContextKind::ParentArtifact) {
            if let Some(parent_id) = &task.parent_id {
                if let Ok(parent) = self.board.get_task(parent_id) {
                    let mut block = format!("Parent task: {} — {}", parent.id, parent.title);
                    if let Some(output) = &parent.output_text {
                        block.push_str(&format!("\nParent output:\n{output}"));
                    }
                    sections.push(block);
                }
            }
        }

        if !self.role.routes_to.is_empty() {
            let routes = self.role.routes_to.iter().map(|(t, r)| format!("{t} -> {r}")).collect::<Vec<_>>().join(", ");
            sections.push(format!("Routes to: {routes}"));
        }

        if self.role.routing_mode == RoutingMode::Open {
            let manifest = self
                .roles
                .values()
                .filter(|r| r.name != self.role.name)
                .map(|r| {
                    let accepts: Vec<&str> = r.routes_to.iter().map(|(t, _)| t.as_str()).collect();
                    format!("{} ({}): accepts {:?}", r.name, r.display_name, accepts)
                })
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("Peer roles:\n{manifest}"));
        }

        if let Some(registry) = &self.context {
            for (name, value) in registry.gather_all(&task.id).await {
                sections.push(format!("[{name}]\n{value}"));
            }
        }

        sections.join("\n\n")
    }

    /// §4.5.6: the outer loop around `run_once`. If a cycle itself raises,
    /// log it, force the instance back to idle, and keep going.
    pub async fn run_until_stopped(&self, poll_interval: Duration) {
        loop {
            if self.state() == AgentLoopState::Stopped {
                return;
            }
            if let Err(e) = self.run_once().await {
                tracing::error!(instance = %self.instance_id, error = %e, "run_once failed, forcing instance idle");
                *self.state.lock() = AgentLoopState::Idle;
                let now = self.clock.utc_now();
                let _ = self.instances.update_status(&self.instance_id, InstanceStatus::Idle, None, now);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
#[path = "agent_loop_tests.rs"]
mod tests;
