// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The composition object (§9 "global state ⇒ composition root") shared by
//! every HTTP handler.

use ob_core::{Role, SystemClock};
use ob_engine::{AutoScaler, EventBus, InstanceManager, TaskBoard, WebhookManager};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<TaskBoard>,
    pub instances: Arc<InstanceManager>,
    pub bus: Arc<EventBus>,
    pub webhooks: Arc<WebhookManager>,
    pub autoscaler: Arc<AutoScaler<SystemClock>>,
    pub roles: Arc<Vec<Role>>,
    pub roles_by_name: Arc<HashMap<String, Role>>,
    pub auth_enabled: bool,
    pub admin_token: Option<String>,
    pub team_tokens: Arc<Vec<String>>,
    pub shutdown: CancellationToken,
}
