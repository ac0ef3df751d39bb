// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged agent message (§4.2 `agent.message`), kept for the dashboard's
/// conversation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub instance_id: String,
    pub task_id: Option<String>,
    pub text: String,
    pub at: DateTime<Utc>,
}
