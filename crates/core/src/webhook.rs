// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook entity (§3.5): an outbound HTTP delivery target subscribed
//! to a set of event name patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    pub events: Vec<String>,
    pub secret: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
}

impl Webhook {
    pub fn new(id: String, url: String, events: Vec<String>, secret: Option<String>, now: DateTime<Utc>) -> Self {
        Self { id, url, events, secret, active: true, created_at: now, last_triggered_at: None }
    }

    /// Whether this webhook should receive a delivery for `event_name`,
    /// per the `"*"` wildcard rule (§4.7).
    pub fn matches(&self, event_name: &str) -> bool {
        self.active && self.events.iter().any(|p| p == "*" || p == event_name)
    }

    pub fn mark_triggered(&mut self, now: DateTime<Utc>) {
        self.last_triggered_at = Some(now);
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
