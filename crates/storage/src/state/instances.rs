// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker instance and role event handlers.

use ob_core::{Event, WorkerInstance};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::InstanceRegistered { instance_id, role, at } => {
            state
                .worker_instances
                .entry(instance_id.clone())
                .or_insert_with(|| WorkerInstance::new(instance_id.clone(), role.clone(), *at));
        }

        Event::InstanceStatusChanged { instance_id, status, current_task_id, at } => {
            if let Some(instance) = state.worker_instances.get_mut(instance_id) {
                instance.status = *status;
                instance.current_task_id = current_task_id.clone();
                instance.last_heartbeat = *at;
            }
        }

        Event::InstanceHeartbeat { instance_id, at } => {
            if let Some(instance) = state.worker_instances.get_mut(instance_id) {
                instance.heartbeat(*at);
            }
        }

        Event::RolePaused { role } => {
            state.paused_roles.insert(role.clone());
        }

        Event::RoleResumed { role } => {
            state.paused_roles.remove(role);
        }

        Event::AgentMessage { instance_id, task_id, text, at } => {
            state.agent_messages.push(crate::state::types::AgentMessage {
                instance_id: instance_id.clone(),
                task_id: task_id.clone(),
                text: text.clone(),
                at: *at,
            });
        }

        _ => {}
    }
}
