// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Auto-Scaler (§4.6): elastic worker instance counts per role, driven
//! by pending-queue depth. Cooldowns are read from the monotonic `Clock`,
//! never the wall clock (§9).

use async_trait::async_trait;
use ob_core::{Clock, Event, InstanceStatus, Role, TaskStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::EngineError;
use crate::event_bus::EventBus;
use crate::instance_manager::InstanceManager;
use crate::task_board::TaskBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Up,
    Down,
}

/// Spawns a new worker instance for `role`. Opaque to the scaler, same as
/// the other duck-typed collaborators in this system (§9).
#[async_trait]
pub trait AgentFactory: Send + Sync + 'static {
    async fn spawn(&self, role: &str, instance_id: &str) -> Result<(), EngineError>;
}

/// Stops a previously auto-spawned instance.
#[async_trait]
pub trait AgentStopper: Send + Sync + 'static {
    async fn stop(&self, instance_id: &str) -> Result<(), EngineError>;
}

/// One tick per role, called on a timer by the composition root. Tracks how
/// many "extra" (auto-spawned) instances exist per role and the last
/// successful scaling action per (role, direction) for cooldown purposes.
pub struct AutoScaler<C: Clock> {
    board: Arc<TaskBoard>,
    instances: Arc<InstanceManager>,
    bus: Arc<EventBus>,
    clock: C,
    factory: Option<Arc<dyn AgentFactory>>,
    stopper: Option<Arc<dyn AgentStopper>>,
    extra: Mutex<HashMap<String, u32>>,
    last_action: Mutex<HashMap<(String, Direction), Instant>>,
}

impl<C: Clock> AutoScaler<C> {
    pub fn new(
        board: Arc<TaskBoard>,
        instances: Arc<InstanceManager>,
        bus: Arc<EventBus>,
        clock: C,
        factory: Option<Arc<dyn AgentFactory>>,
        stopper: Option<Arc<dyn AgentStopper>>,
    ) -> Self {
        Self { board, instances, bus, clock, factory, stopper, extra: Mutex::new(HashMap::new()), last_action: Mutex::new(HashMap::new()) }
    }

    pub fn extra_instances(&self, role: &str) -> u32 {
        *self.extra.lock().get(role).unwrap_or(&0)
    }

    fn on_cooldown(&self, role: &str, direction: Direction, cooldown: Duration) -> bool {
        self.last_action
            .lock()
            .get(&(role.to_string(), direction))
            .is_some_and(|last| self.clock.now().saturating_duration_since(*last) < cooldown)
    }

    fn record_action(&self, role: &str, direction: Direction) {
        self.last_action.lock().insert((role.to_string(), direction), self.clock.now());
    }

    /// §4.6.1-§4.6.3: one scaling decision for `role`. No-op if
    /// `auto_scale.enabled = false`.
    pub async fn tick(&self, role: &Role) -> Result<(), EngineError> {
        if !role.auto_scale.enabled {
            return Ok(());
        }

        let pending =
            self.board.get_board(Some(&role.name)).get(&TaskStatus::Pending).map(Vec::len).unwrap_or(0) as u32;
        let active = self
            .instances
            .get_instances_by_role(&role.name)
            .iter()
            .filter(|i| matches!(i.status, InstanceStatus::Idle | InstanceStatus::Working))
            .count() as u32;

        let threshold = role.auto_scale.scale_up_threshold;
        let max_inst = role.max_instances;
        let cooldown = Duration::from_secs(role.auto_scale.cooldown_secs);

        if pending > threshold && active < max_inst && !self.on_cooldown(&role.name, Direction::Up, cooldown) {
            self.scale_up(role, pending, threshold, active, max_inst).await
        } else if self.extra_instances(&role.name) > 0
            && pending == 0
            && !self.on_cooldown(&role.name, Direction::Down, cooldown)
        {
            self.scale_down(role).await
        } else {
            Ok(())
        }
    }

    async fn scale_up(&self, role: &Role, pending: u32, threshold: u32, active: u32, max_inst: u32) -> Result<(), EngineError> {
        let needed = (pending - threshold).min(max_inst - active);
        if needed == 0 {
            return Ok(());
        }

        let Some(factory) = &self.factory else {
            self.bus.emit(Event::AutoscaleNeeded { role: role.name.clone(), pending_count: pending, at: self.clock.utc_now() });
            return Ok(());
        };

        let mut extra = self.extra_instances(&role.name);
        for i in 1..=needed {
            let instance_id = format!("{}-auto-{}", role.name, extra + i);
            match factory.spawn(&role.name, &instance_id).await {
                Ok(()) => {
                    extra += 1;
                    self.extra.lock().insert(role.name.clone(), extra);
                    self.record_action(&role.name, Direction::Up);
                }
                Err(e) => {
                    tracing::warn!(role = %role.name, instance_id, error = %e, "failed to spawn auto-scaled instance");
                }
            }
        }
        Ok(())
    }

    async fn scale_down(&self, role: &Role) -> Result<(), EngineError> {
        let now = self.clock.utc_now();
        let idle_threshold = chrono::Duration::seconds(role.auto_scale.scale_down_idle_threshold_secs as i64);

        let candidates: Vec<_> = self
            .instances
            .get_instances_by_role(&role.name)
            .into_iter()
            .filter(|i| i.idle_duration(now).is_some_and(|idle| idle >= idle_threshold))
            .collect();

        let extra = self.extra_instances(&role.name);
        let scale_down = extra.min(candidates.len() as u32);
        if scale_down == 0 {
            return Ok(());
        }

        let Some(stopper) = &self.stopper else {
            self.bus.emit(Event::AutoscaleNeeded { role: role.name.clone(), pending_count: 0, at: now });
            return Ok(());
        };

        let mut remaining = extra;
        for candidate in candidates.into_iter().take(scale_down as usize) {
            match stopper.stop(&candidate.id).await {
                Ok(()) => {
                    remaining -= 1;
                    self.extra.lock().insert(role.name.clone(), remaining);
                    self.record_action(&role.name, Direction::Down);
                }
                Err(e) => {
                    tracing::warn!(role = %role.name, instance = %candidate.id, error = %e, "failed to stop auto-scaled instance");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "auto_scaler_tests.rs"]
mod tests;
