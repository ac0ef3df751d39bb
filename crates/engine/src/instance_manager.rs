// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Instance Manager (§4.3): registration, status, heartbeat, and
//! per-role pause/resume of worker instances.

use chrono::{DateTime, Utc};
use ob_core::{Event, InstanceStatus, WorkerInstance};
use ob_storage::Store;
use std::sync::Arc;

use crate::error::EngineError;

/// Thin command/query layer over the Store's `worker_instances` and
/// `paused_roles` tables. Status transitions are last-writer-wins (§4.3).
pub struct InstanceManager {
    store: Arc<Store>,
}

impl InstanceManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn register(&self, instance_id: &str, role: &str, now: DateTime<Utc>) -> Result<WorkerInstance, EngineError> {
        self.store.append(Event::InstanceRegistered {
            instance_id: instance_id.to_string(),
            role: role.to_string(),
            at: now,
        })?;
        self.get(instance_id)
    }

    pub fn update_status(
        &self,
        instance_id: &str,
        status: InstanceStatus,
        current_task_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WorkerInstance, EngineError> {
        self.store.append(Event::InstanceStatusChanged {
            instance_id: instance_id.to_string(),
            status,
            current_task_id,
            at: now,
        })?;
        self.get(instance_id)
    }

    pub fn heartbeat(&self, instance_id: &str, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.store.append(Event::InstanceHeartbeat { instance_id: instance_id.to_string(), at: now })?;
        Ok(())
    }

    pub fn pause_role(&self, role: &str) -> Result<(), EngineError> {
        self.store.append(Event::RolePaused { role: role.to_string() })?;
        Ok(())
    }

    pub fn resume_role(&self, role: &str) -> Result<(), EngineError> {
        self.store.append(Event::RoleResumed { role: role.to_string() })?;
        Ok(())
    }

    pub fn is_role_paused(&self, role: &str) -> bool {
        self.store.read_snapshot().paused_roles.contains(role)
    }

    pub fn get(&self, instance_id: &str) -> Result<WorkerInstance, EngineError> {
        self.store
            .read_snapshot()
            .worker_instances
            .get(instance_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(instance_id.to_string()))
    }

    pub fn get_instances_by_role(&self, role: &str) -> Vec<WorkerInstance> {
        self.store
            .read_snapshot()
            .worker_instances
            .values()
            .filter(|i| i.role == role)
            .cloned()
            .collect()
    }

    /// Instances of `role` with a heartbeat older than `stale_threshold`
    /// relative to `now` (§4.3: "a worker whose heartbeat is older than a
    /// stale threshold (10 minutes) is considered suspect").
    pub fn suspect_instances(
        &self,
        role: &str,
        now: DateTime<Utc>,
        stale_threshold: chrono::Duration,
    ) -> Vec<WorkerInstance> {
        self.get_instances_by_role(role)
            .into_iter()
            .filter(|i| now - i.last_heartbeat >= stale_threshold)
            .collect()
    }
}

#[cfg(test)]
#[path = "instance_manager_tests.rs"]
mod tests;
