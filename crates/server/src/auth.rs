// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §6.2: team-token and admin-token `axum::middleware::from_fn` layers.

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

const SKIP_PREFIXES: &[&str] = &["/ws", "/static"];
const SKIP_EXACT: &[&str] = &["/", "/metrics", "/settings", "/api/health", "/docs", "/redoc", "/openapi.json"];

fn is_skip_path(path: &str) -> bool {
    SKIP_EXACT.contains(&path) || SKIP_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

fn bearer_token(request: &Request) -> Option<&str> {
    request.headers().get(axum::http::header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

/// Always-on (when `team_tokens` is non-empty) token check, skipped for the
/// fixed path list and all `OPTIONS` preflights.
pub async fn team_token_layer(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, StatusCode> {
    if state.team_tokens.is_empty() || request.method() == Method::OPTIONS || is_skip_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }
    match bearer_token(&request) {
        Some(token) if state.team_tokens.contains(&token.to_string()) => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Protects a small set of destructive endpoints (e.g. `/api/server/restart`)
/// when `AUTH_ENABLED=true`.
pub async fn admin_token_layer(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, StatusCode> {
    if !state.auth_enabled {
        return Ok(next.run(request).await);
    }
    let Some(expected) = &state.admin_token else {
        return Ok(next.run(request).await);
    };
    match bearer_token(&request) {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
