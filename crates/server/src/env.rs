// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate (§6.7).

use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: `OB_STATE_DIR` > `XDG_STATE_HOME/ob` > `~/.local/state/ob`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OB_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("ob");
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".local/state/ob")
}

/// Bind address for the dashboard HTTP server.
pub fn http_addr() -> String {
    std::env::var("OB_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string())
}

/// Allowed CORS origins. Defaults to the two local dev ports; `*` is never
/// the default — an operator must opt in explicitly.
pub fn cors_origins() -> Vec<String> {
    std::env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:8000,http://localhost:3000".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether the admin-token mechanism (§6.2) is enabled.
pub fn auth_enabled() -> bool {
    std::env::var("AUTH_ENABLED").map(|v| v == "true").unwrap_or(false)
}

/// The admin bearer token checked when `AUTH_ENABLED=true`.
pub fn admin_token() -> Option<String> {
    std::env::var("OB_ADMIN_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Team bearer tokens for the always-on team-token mechanism (§6.2).
/// Empty/unset disables that mechanism.
pub fn team_tokens() -> Vec<String> {
    std::env::var("OB_TEAM_TOKENS")
        .ok()
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Graceful-shutdown drain timeout (§5: 5 seconds).
pub fn shutdown_timeout() -> Duration {
    Duration::from_secs(5)
}

/// How often the Auto-Scaler ticks each role.
pub fn autoscale_interval() -> Duration {
    std::env::var("OB_AUTOSCALE_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(15))
}
