// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and task-dependency event handlers.

use ob_core::{Event, NewTask, Task, TaskDependency, TaskUsage};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::TaskCreated {
            task_id,
            group_id,
            parent_id,
            revision_of,
            title,
            description,
            task_type,
            priority,
            assigned_to,
            created_by,
            blocked_by,
            at,
        } => {
            if state.tasks.contains_key(task_id) {
                return;
            }
            let fields = NewTask {
                group_id: group_id.clone(),
                title: title.clone(),
                description: description.clone(),
                task_type: task_type.clone(),
                assigned_to: assigned_to.clone(),
                priority: *priority,
                created_by: created_by.clone(),
                parent_id: parent_id.clone(),
                revision_of: revision_of.clone(),
                blocked_by: blocked_by.clone(),
            };
            state.tasks.insert(task_id.clone(), Task::new(task_id.clone(), &fields, *at));

            if !blocked_by.is_empty() {
                let edges = state.task_dependencies.entry(task_id.clone()).or_default();
                for blocker in blocked_by {
                    edges.push(TaskDependency::new(task_id.clone(), blocker.clone()));
                }
            }
        }

        Event::TaskClaimed { task_id, instance_id, at } => {
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.claim(instance_id, *at);
            }
        }

        Event::TaskCompleted { task_id, output_text, at } => {
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.complete(output_text.clone(), *at);
            }
        }

        Event::TaskFailed { task_id, at } => {
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.fail(*at);
            }
        }

        Event::TaskRejected { task_id, reason, at } => {
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.reject(reason.clone(), *at);
            }
        }

        Event::TaskCancelled { task_id, reason, at } => {
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.cancel(reason.clone(), *at);
            }
        }

        Event::TaskUsageRecorded { task_id, input_tokens, output_tokens, cost_usd, duration_ms, num_turns } => {
            state.task_usage.insert(
                task_id.clone(),
                TaskUsage {
                    input_tokens: *input_tokens,
                    output_tokens: *output_tokens,
                    cost_usd: *cost_usd,
                    duration_ms: *duration_ms,
                    num_turns: *num_turns,
                },
            );
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.usage = state.task_usage.get(task_id).cloned();
            }
        }

        Event::DependencyResolved { task_id, blocked_by, at } => {
            if let Some(edges) = state.task_dependencies.get_mut(task_id) {
                for edge in edges.iter_mut() {
                    if &edge.blocked_by == blocked_by {
                        edge.resolve(*at);
                    }
                }
            }
            let still_blocked = state
                .task_dependencies
                .get(task_id)
                .map(|edges| edges.iter().any(|e| !e.resolved))
                .unwrap_or(false);
            if !still_blocked {
                if let Some(task) = state.tasks.get_mut(task_id) {
                    if task.status == ob_core::TaskStatus::Blocked {
                        task.status = ob_core::TaskStatus::Pending;
                    }
                }
            }
        }

        _ => {}
    }
}
