// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `obd`: the composition root. Opens the Store, wires the Task Board,
//! Instance Manager, Event Bus, Webhook Manager, and Auto-Scaler, recovers
//! any state left behind by a crashed run, then serves the dashboard HTTP
//! API (§6) until shutdown.

mod auth;
mod env;
mod error;
mod roles;
mod routes;
mod state;

use ob_core::SystemClock;
use ob_engine::{AutoScaler, EventBus, InstanceManager, TaskBoard, WebhookManager};
use ob_storage::Store;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let state_dir = env::state_dir();
    std::fs::create_dir_all(&state_dir)?;
    tracing::info!(dir = %state_dir.display(), "opening store");
    let store = Arc::new(Store::open(&state_dir)?);

    let board = Arc::new(TaskBoard::new(store.clone()));
    let instances = Arc::new(InstanceManager::new(store.clone()));
    let bus = Arc::new(EventBus::new());
    let webhooks = Arc::new(WebhookManager::new(store.clone(), bus.clone()));
    let autoscaler = Arc::new(AutoScaler::new(board.clone(), instances.clone(), bus.clone(), SystemClock, None, None));

    recover(&board);

    webhooks.start().await;

    let roles = Arc::new(roles::default_roles());
    let roles_by_name = Arc::new(roles::roles_by_name(&roles));
    let shutdown = CancellationToken::new();

    spawn_autoscaler_ticker(autoscaler.clone(), roles.clone(), shutdown.clone());

    let app_state = AppState {
        board,
        instances,
        bus,
        webhooks,
        autoscaler,
        roles,
        roles_by_name,
        auth_enabled: env::auth_enabled(),
        admin_token: env::admin_token(),
        team_tokens: Arc::new(env::team_tokens()),
        shutdown: shutdown.clone(),
    };

    let cors = build_cors(&env::cors_origins());
    let app = routes::router(app_state).layer(cors).layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = env::http_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    serve_with_bounded_shutdown(listener, app, shutdown, env::shutdown_timeout()).await
}

/// §4.4.7: reset orphaned in-progress tasks and re-evaluate blocked tasks
/// whose blockers are all now terminal. Run once, synchronously, at boot.
fn recover(board: &TaskBoard) {
    match board.recover_orphaned_tasks() {
        Ok(tasks) if !tasks.is_empty() => tracing::warn!(count = tasks.len(), "recovered orphaned in-progress tasks"),
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "failed to recover orphaned tasks"),
    }
    match board.recover_stuck_blocked_tasks(chrono::Utc::now()) {
        Ok(tasks) if !tasks.is_empty() => tracing::info!(count = tasks.len(), "unblocked stuck tasks"),
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "failed to recover stuck blocked tasks"),
    }
}

fn spawn_autoscaler_ticker(
    autoscaler: Arc<AutoScaler<SystemClock>>,
    roles: Arc<Vec<ob_core::Role>>,
    shutdown: CancellationToken,
) {
    let interval = env::autoscale_interval();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    for role in roles.iter() {
                        if let Err(e) = autoscaler.tick(role).await {
                            tracing::warn!(role = %role.name, error = %e, "autoscaler tick failed");
                        }
                    }
                }
                _ = shutdown.cancelled() => return,
            }
        }
    });
}

fn build_cors(origins: &[String]) -> tower_http::cors::CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return tower_http::cors::CorsLayer::permissive();
    }
    let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    tower_http::cors::CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// §5: deactivating the server awaits shutdown with a 5-second timeout;
/// after timeout the remaining tasks are abandoned.
async fn serve_with_bounded_shutdown(
    listener: TcpListener,
    app: axum::Router,
    shutdown: CancellationToken,
    timeout: std::time::Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let serve_shutdown = shutdown.clone();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move { serve_shutdown.cancelled().await });

    tokio::select! {
        result = serve => result.map_err(Into::into),
        _ = wait_for_signal_then_bound(shutdown, timeout) => Ok(()),
    }
}

async fn wait_for_signal_then_bound(shutdown: CancellationToken, timeout: std::time::Duration) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::signal::ctrl_c() => { shutdown.cancel(); }
    }
    tokio::time::sleep(timeout).await;
    tracing::warn!(?timeout, "graceful shutdown timed out, abandoning in-flight requests");
}
