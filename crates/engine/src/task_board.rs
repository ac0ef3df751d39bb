// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Task Board (§4.4): groups, tasks, the dependency graph, atomic
//! claim, completion, failure cascade, and boot-time recovery. The Board
//! itself emits no bus events (§4.4.5) — every mutating method returns the
//! `Event`s it persisted so the caller (Agent Loop, dashboard handler,
//! recovery code) decides whether to fan them out.

use chrono::{DateTime, Utc};
use ob_core::{Event, Group, GroupStatus, NewTask, Task, TaskStatus, TaskUsage};
use ob_storage::{MaterializedState, Store};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::error::EngineError;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SearchResult {
    pub total: usize,
    pub tasks: Vec<Task>,
}

pub struct TaskBoard {
    store: Arc<Store>,
}

impl TaskBoard {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn create_group(
        &self,
        prefix: &str,
        title: &str,
        origin: &str,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(Group, Event), EngineError> {
        let group_id = self.store.mint_id(prefix);
        let event = Event::GroupCreated {
            group_id: group_id.clone(),
            title: title.to_string(),
            origin: origin.to_string(),
            created_by: created_by.to_string(),
            at: now,
        };
        self.store.append(event.clone())?;
        Ok((self.get_group(&group_id)?, event))
    }

    /// Mints the task ID from `prefix`, creates dependency edges for every
    /// ID in `fields.blocked_by`, and logs (never rejects) a duplicate
    /// `(parent_id, task_type)` child — the preserved Open Question
    /// resolution in DESIGN.md.
    pub fn create_task(&self, prefix: &str, fields: NewTask, now: DateTime<Utc>) -> Result<(Task, Vec<Event>), EngineError> {
        if let Some(parent_id) = &fields.parent_id {
            let state = self.store.read_snapshot();
            let duplicate = state.tasks.values().any(|t| {
                t.parent_id.as_deref() == Some(parent_id.as_str())
                    && t.task_type == fields.task_type
                    && t.status != TaskStatus::Cancelled
            });
            if duplicate {
                tracing::warn!(
                    parent_id,
                    task_type = %fields.task_type,
                    "duplicate (parent_id, task_type) child task created; proceeding per spec"
                );
            }
        }

        let task_id = self.store.mint_id(prefix);
        let event = Event::TaskCreated {
            task_id: task_id.clone(),
            group_id: fields.group_id,
            parent_id: fields.parent_id,
            revision_of: fields.revision_of,
            title: fields.title,
            description: fields.description,
            task_type: fields.task_type,
            priority: fields.priority,
            assigned_to: fields.assigned_to,
            created_by: fields.created_by,
            blocked_by: fields.blocked_by,
            at: now,
        };
        self.store.append(event.clone())?;
        Ok((self.get_task(&task_id)?, vec![event]))
    }

    pub fn get_task(&self, id: &str) -> Result<Task, EngineError> {
        self.store.read_snapshot().tasks.get(id).cloned().ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    pub fn get_group(&self, id: &str) -> Result<Group, EngineError> {
        self.store.read_snapshot().groups.get(id).cloned().ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    pub fn get_group_tasks(&self, group_id: &str) -> Vec<Task> {
        self.store.read_snapshot().tasks_in_group(group_id).into_iter().cloned().collect()
    }

    pub fn get_groups(&self, status: Option<GroupStatus>) -> Vec<Group> {
        self.store
            .read_snapshot()
            .groups
            .values()
            .filter(|g| status.map(|s| g.status == s).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Tasks grouped by status, optionally restricted to one role (§4.4.1
    /// `get_board`).
    pub fn get_board(&self, assigned_to: Option<&str>) -> HashMap<TaskStatus, Vec<Task>> {
        let mut board: HashMap<TaskStatus, Vec<Task>> = HashMap::new();
        for task in self.store.read_snapshot().tasks.into_values() {
            if assigned_to.is_some_and(|role| task.assigned_to != role) {
                continue;
            }
            board.entry(task.status).or_default().push(task);
        }
        board
    }

    /// Case-insensitive substring match over title/description.
    pub fn search_tasks(&self, query: &str, assigned_to: Option<&str>) -> SearchResult {
        let needle = query.to_lowercase();
        let tasks: Vec<Task> = self
            .store
            .read_snapshot()
            .tasks
            .into_values()
            .filter(|t| assigned_to.is_none_or(|role| t.assigned_to == role))
            .filter(|t| t.title.to_lowercase().contains(&needle) || t.description.to_lowercase().contains(&needle))
            .collect();
        SearchResult { total: tasks.len(), tasks }
    }

    /// §4.4.4: would adding the edge `(task, candidate_blocker)` close a
    /// cycle in the unresolved dependency graph?
    pub fn has_cycle(&self, task: &str, candidate_blocker: &str) -> bool {
        let state = self.store.read_snapshot();
        let edges = unresolved_edges(&state);
        ob_core::has_cycle(&edges, task, candidate_blocker)
    }

    /// The atomic claim (§4.4.2), delegated to the Store's single critical
    /// section; re-derives the `TaskClaimed` event from the claimed row so
    /// the caller can fan it out on the Bus.
    pub fn claim_task(&self, role: &str, instance: &str, now: DateTime<Utc>) -> Result<Option<(Task, Event)>, EngineError> {
        let Some(task) = self.store.claim_next(role, instance, now)? else {
            return Ok(None);
        };
        let event = Event::TaskClaimed {
            task_id: task.id.clone(),
            instance_id: instance.to_string(),
            at: task.started_at.unwrap_or(now),
        };
        Ok(Some((task, event)))
    }

    /// §4.4.5: persist completion, resolve dependent edges, and
    /// auto-complete the parent group if every one of its tasks is now
    /// terminal.
    pub fn complete_task(&self, task_id: &str, output: Option<String>, now: DateTime<Utc>) -> Result<(Task, Vec<Event>), EngineError> {
        let task_id = task_id.to_string();
        let events = self.store.transaction::<Vec<Event>, EngineError>(|state| {
            let task = state.get_task(&task_id).ok_or_else(|| EngineError::NotFound(task_id.clone()))?;
            if task.status != TaskStatus::InProgress {
                return Err(EngineError::InvalidState(format!("task {task_id} is not in_progress")));
            }
            let group_id = task.group_id.clone();

            let mut events = vec![Event::TaskCompleted { task_id: task_id.clone(), output_text: output.clone(), at: now }];
            for dependent in state.dependents_of(&task_id) {
                events.push(Event::DependencyResolved { task_id: dependent.to_string(), blocked_by: task_id.clone(), at: now });
            }
            if group_would_complete(state, &group_id, &task_id) {
                events.push(Event::GroupCompleted { group_id, at: now });
            }
            Ok((events.clone(), events))
        })?;
        Ok((self.get_task(&task_id)?, events))
    }

    /// §4.5.2e: persist the run's token/cost usage against the task. A
    /// separate, independent WAL append from `complete_task` — usage may be
    /// available even when the loop hasn't yet decided success or failure.
    pub fn record_task_usage(&self, task_id: &str, usage: TaskUsage) -> Result<Event, EngineError> {
        let event = Event::TaskUsageRecorded {
            task_id: task_id.to_string(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost_usd: usage.cost_usd,
            duration_ms: usage.duration_ms,
            num_turns: usage.num_turns,
        };
        self.store.append(event.clone())?;
        Ok(event)
    }

    pub fn reject_task(&self, task_id: &str, reason: String, now: DateTime<Utc>) -> Result<(Task, Vec<Event>), EngineError> {
        let task_id = task_id.to_string();
        let events = self.store.transaction::<Vec<Event>, EngineError>(|state| {
            let task = state.get_task(&task_id).ok_or_else(|| EngineError::NotFound(task_id.clone()))?;
            if task.status.is_terminal() {
                return Err(EngineError::InvalidState(format!("task {task_id} is already terminal")));
            }
            let events = vec![Event::TaskRejected { task_id: task_id.clone(), reason, at: now }];
            Ok((events.clone(), events))
        })?;
        Ok((self.get_task(&task_id)?, events))
    }

    pub fn cancel_task(&self, task_id: &str, reason: String, now: DateTime<Utc>) -> Result<(Task, Vec<Event>), EngineError> {
        let task_id = task_id.to_string();
        let events = self.store.transaction::<Vec<Event>, EngineError>(|state| {
            let task = state.get_task(&task_id).ok_or_else(|| EngineError::NotFound(task_id.clone()))?;
            if task.status.is_terminal() {
                return Err(EngineError::InvalidState(format!("task {task_id} is already terminal")));
            }
            let events = vec![Event::TaskCancelled { task_id: task_id.clone(), reason, at: now }];
            Ok((events.clone(), events))
        })?;
        Ok((self.get_task(&task_id)?, events))
    }

    /// §4.4.6: fail `task_id` and recursively fail every task transitively
    /// blocked on it.
    pub fn fail_task(&self, task_id: &str, now: DateTime<Utc>) -> Result<(Task, Vec<Event>), EngineError> {
        let task_id = task_id.to_string();
        let events = self.store.transaction::<Vec<Event>, EngineError>(|state| {
            state.get_task(&task_id).ok_or_else(|| EngineError::NotFound(task_id.clone()))?;
            let events = cascade_fail_events(state, &task_id, now);
            Ok((events.clone(), events))
        })?;
        Ok((self.get_task(&task_id)?, events))
    }

    /// §4.4.7, first half: reset tasks left `in_progress` by a crashed
    /// worker. Delegates to the Store, which mutates state directly without
    /// a WAL event since recovery is idempotent and re-derivable on boot.
    pub fn recover_orphaned_tasks(&self) -> Result<Vec<Task>, EngineError> {
        Ok(self.store.recover_orphaned_tasks()?)
    }

    /// §4.4.7, second half: a blocked task whose blockers are all terminal
    /// but whose edges were never resolved (crash between complete and
    /// resolve). Resolves the stale edges; cascade-fails the task if any
    /// blocker had failed, otherwise lets it fall through to `pending`.
    pub fn recover_stuck_blocked_tasks(&self, now: DateTime<Utc>) -> Result<Vec<Task>, EngineError> {
        let recovered_ids = self.store.transaction::<Vec<String>, EngineError>(|state| {
            let mut events = Vec::new();
            let mut recovered = Vec::new();

            for task in state.tasks.values().filter(|t| t.status == TaskStatus::Blocked) {
                let unresolved = state.unresolved_blockers(&task.id);
                if unresolved.is_empty() {
                    continue;
                }
                let all_terminal = unresolved
                    .iter()
                    .all(|blocker| state.get_task(blocker).is_some_and(|b| b.status.is_terminal()));
                if !all_terminal {
                    continue;
                }

                let any_failed =
                    unresolved.iter().any(|blocker| state.get_task(blocker).is_some_and(|b| b.status == TaskStatus::Failed));
                for blocker in &unresolved {
                    events.push(Event::DependencyResolved { task_id: task.id.clone(), blocked_by: blocker.to_string(), at: now });
                }
                if any_failed {
                    events.extend(cascade_fail_events(state, &task.id, now));
                }
                recovered.push(task.id.clone());
            }
            Ok((events.clone(), recovered))
        })?;
        recovered_ids.into_iter().map(|id| self.get_task(&id)).collect()
    }
}

fn unresolved_edges(state: &MaterializedState) -> Vec<(&str, &str)> {
    state
        .tasks
        .keys()
        .flat_map(|task_id| {
            state
                .unresolved_blockers(task_id)
                .into_iter()
                .map(move |blocker| (task_id.as_str(), blocker))
        })
        .collect()
}

fn group_would_complete(state: &MaterializedState, group_id: &str, completing_task_id: &str) -> bool {
    match state.get_group(group_id) {
        Some(group) if group.status == GroupStatus::Active => {}
        _ => return false,
    }
    state
        .tasks_in_group(group_id)
        .iter()
        .all(|t| t.id == completing_task_id || t.status.is_terminal())
}

/// Fail `task_id` and BFS down every unresolved dependent, failing each one
/// and marking its edge to the failing node resolved (§4.4.6). Operates
/// over the pre-mutation snapshot — the edge table doesn't change mid-BFS
/// since nothing here has been applied yet.
fn cascade_fail_events(state: &MaterializedState, task_id: &str, now: DateTime<Utc>) -> Vec<Event> {
    let mut events = Vec::new();
    let mut queue = VecDeque::from([task_id.to_string()]);
    let mut seen = HashSet::from([task_id.to_string()]);

    while let Some(current) = queue.pop_front() {
        events.push(Event::TaskFailed { task_id: current.clone(), at: now });
        for dependent in state.dependents_of(&current) {
            if seen.insert(dependent.to_string()) {
                events.push(Event::DependencyResolved {
                    task_id: dependent.to_string(),
                    blocked_by: current.clone(),
                    at: now,
                });
                queue.push_back(dependent.to_string());
            }
        }
    }
    events
}

#[cfg(test)]
#[path = "task_board_tests.rs"]
mod tests;
