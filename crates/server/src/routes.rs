// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §6.1: the HTTP API surface plus `/ws`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use ob_core::{GroupStatus, NewTask, Priority};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use crate::auth::{admin_token_layer, team_token_layer};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/server/restart", post(restart))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), admin_token_layer));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/board", get(get_board))
        .route("/api/groups", get(get_groups))
        .route("/api/goals", post(create_goal))
        .route("/api/tasks", post(create_task))
        .route("/api/tasks/search", get(search_tasks))
        .route("/api/tasks/:id", get(get_task).patch(patch_task).delete(delete_task))
        .route("/api/tasks/:id/complete", post(complete_task))
        .route("/api/tasks/:id/cancel", post(cancel_task))
        .route("/api/agents", get(get_agents))
        .route("/api/agents/pause", post(pause_agents))
        .route("/api/agents/resume", post(resume_agents))
        .route("/api/webhooks", get(get_webhooks).post(create_webhook))
        .route("/api/webhooks/:id", axum::routing::delete(delete_webhook))
        .route("/ws", get(ws_handler))
        .merge(admin_routes)
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), team_token_layer))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct BoardQuery {
    group_id: Option<String>,
    assigned_to: Option<String>,
    claimed_by: Option<String>,
    task_type: Option<String>,
    priority: Option<Priority>,
}

async fn get_board(State(state): State<AppState>, Query(q): Query<BoardQuery>) -> impl IntoResponse {
    let mut board = state.board.get_board(q.assigned_to.as_deref());
    for tasks in board.values_mut() {
        tasks.retain(|t| {
            q.group_id.as_deref().is_none_or(|g| t.group_id == g)
                && q.claimed_by.as_deref().is_none_or(|c| t.claimed_by.as_deref() == Some(c))
                && q.task_type.as_deref().is_none_or(|ty| t.task_type == ty)
                && q.priority.is_none_or(|p| t.priority == p)
        });
    }
    Json(board)
}

#[derive(Deserialize)]
struct GroupsQuery {
    status: Option<GroupStatus>,
}

async fn get_groups(State(state): State<AppState>, Query(q): Query<GroupsQuery>) -> impl IntoResponse {
    Json(state.board.get_groups(q.status))
}

#[derive(Deserialize)]
struct CreateGoalBody {
    title: String,
    description: String,
}

async fn create_goal(State(state): State<AppState>, Json(body): Json<CreateGoalBody>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let (group, group_event) = state.board.create_group("GRP", &body.title, "dashboard", "dashboard", now)?;
    state.bus.emit(group_event);
    let root_role = state.roles.first().map(|r| r.name.clone()).unwrap_or_default();
    let (task, events) = state.board.create_task(
        &root_role_prefix(&state, &root_role),
        NewTask {
            group_id: group.id.clone(),
            title: body.title,
            description: body.description,
            task_type: "goal".to_string(),
            assigned_to: root_role,
            priority: Priority::Medium,
            created_by: "dashboard".to_string(),
            parent_id: None,
            revision_of: None,
            blocked_by: vec![],
        },
        now,
    )?;
    for event in events {
        state.bus.emit(event);
    }
    Ok(Json(json!({ "group": group, "task": task })))
}

fn root_role_prefix(state: &AppState, role: &str) -> String {
    state.roles_by_name.get(role).map(|r| r.prefix.clone()).unwrap_or_else(|| "TSK".to_string())
}

#[derive(Deserialize)]
struct CreateTaskBody {
    group_id: String,
    title: String,
    assigned_to: String,
    #[allow(dead_code)]
    assigned_by: String,
    task_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Priority,
    parent_id: Option<String>,
    #[serde(default)]
    blocked_by: Vec<String>,
}

async fn create_task(State(state): State<AppState>, Json(body): Json<CreateTaskBody>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let prefix = root_role_prefix(&state, &body.assigned_to);
    for blocker in &body.blocked_by {
        if state.board.get_task(blocker).is_ok() {
            continue;
        }
        return Err(ApiError(ob_engine::EngineError::NotFound(blocker.clone())));
    }
    let (task, events) = state.board.create_task(
        &prefix,
        NewTask {
            group_id: body.group_id,
            title: body.title,
            description: body.description,
            task_type: body.task_type,
            assigned_to: body.assigned_to,
            priority: body.priority,
            created_by: body.assigned_by,
            parent_id: body.parent_id,
            revision_of: None,
            blocked_by: body.blocked_by,
        },
        now,
    )?;
    for event in events {
        state.bus.emit(event);
    }
    Ok(Json(task))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    assigned_to: Option<String>,
}

async fn search_tasks(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> impl IntoResponse {
    Json(state.board.search_tasks(&q.q, q.assigned_to.as_deref()))
}

async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.board.get_task(&id)?))
}

#[derive(Deserialize)]
struct PatchTaskBody {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

async fn patch_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PatchTaskBody>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let reason = body.reason.unwrap_or_default();
    let (task, events) = match body.status.as_str() {
        "cancelled" => state.board.cancel_task(&id, reason, now)?,
        "rejected" => state.board.reject_task(&id, reason, now)?,
        other => return Err(ApiError(ob_engine::EngineError::InvalidState(format!("unsupported target status {other}")))),
    };
    for event in events {
        state.bus.emit(event);
    }
    Ok(Json(task))
}

async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let (task, events) = state.board.cancel_task(&id, "deleted via API".to_string(), now)?;
    for event in events {
        state.bus.emit(event);
    }
    Ok(Json(task))
}

#[derive(Deserialize)]
struct CompleteTaskBody {
    output: Option<String>,
}

async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CompleteTaskBody>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let (task, events) = state.board.complete_task(&id, body.output, now)?;
    for event in events {
        state.bus.emit(event);
    }
    Ok(Json(task))
}

#[derive(Deserialize)]
struct CancelTaskBody {
    reason: String,
}

async fn cancel_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CancelTaskBody>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let (task, events) = state.board.cancel_task(&id, body.reason, now)?;
    for event in events {
        state.bus.emit(event);
    }
    Ok(Json(task))
}

#[derive(Serialize)]
struct AgentsResponse {
    instances: Vec<ob_core::WorkerInstance>,
    auto_scaled_extra: HashMap<String, u32>,
}

async fn get_agents(State(state): State<AppState>) -> impl IntoResponse {
    let instances: Vec<_> = state.roles.iter().flat_map(|r| state.instances.get_instances_by_role(&r.name)).collect();
    let auto_scaled_extra =
        state.roles.iter().map(|r| (r.name.clone(), state.autoscaler.extra_instances(&r.name))).collect();
    Json(AgentsResponse { instances, auto_scaled_extra })
}

#[derive(Deserialize)]
struct RoleScopeBody {
    role: Option<String>,
}

async fn pause_agents(State(state): State<AppState>, Json(body): Json<RoleScopeBody>) -> Result<impl IntoResponse, ApiError> {
    let roles = scoped_roles(&state, body.role);
    for role in &roles {
        state.instances.pause_role(role)?;
    }
    Ok(Json(json!({ "paused": roles })))
}

async fn resume_agents(State(state): State<AppState>, Json(body): Json<RoleScopeBody>) -> Result<impl IntoResponse, ApiError> {
    let roles = scoped_roles(&state, body.role);
    for role in &roles {
        state.instances.resume_role(role)?;
    }
    Ok(Json(json!({ "resumed": roles })))
}

fn scoped_roles(state: &AppState, role: Option<String>) -> Vec<String> {
    match role {
        Some(role) => vec![role],
        None => state.roles.iter().map(|r| r.name.clone()).collect(),
    }
}

async fn get_webhooks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.webhooks.get_webhooks())
}

#[derive(Deserialize)]
struct CreateWebhookBody {
    url: String,
    events: Vec<String>,
    secret: Option<String>,
}

async fn create_webhook(State(state): State<AppState>, Json(body): Json<CreateWebhookBody>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.webhooks.create_webhook(body.url, body.events, body.secret)?))
}

async fn delete_webhook(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    state.webhooks.delete_webhook(&id)?;
    Ok(Json(json!({ "deleted": id })))
}

async fn restart(State(state): State<AppState>) -> impl IntoResponse {
    state.shutdown.cancel();
    Json(json!({ "status": "shutting_down" }))
}

#[derive(Serialize)]
struct WsEnvelope<'a> {
    event: &'a str,
    data: ob_core::Event,
    timestamp: chrono::DateTime<Utc>,
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_events(socket, state))
}

async fn forward_events(mut socket: WebSocket, state: AppState) {
    let mut rx = state.bus.subscribe("*");
    while let Some(event) = rx.recv().await {
        let envelope = WsEnvelope { event: event.name(), data: event, timestamp: Utc::now() };
        let Ok(text) = serde_json::to_string(&envelope) else { continue };
        if socket.send(Message::Text(text)).await.is_err() {
            return;
        }
    }
}
