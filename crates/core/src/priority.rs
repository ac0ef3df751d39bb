// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task priority and its fixed ordering (§4.4.8).

use serde::{Deserialize, Serialize};

/// Task priority. The ranking below is fixed and must never be overridable
/// at runtime: `critical=0, high=1, medium=2, low=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: lower sorts first (claimed before higher ranks).
    /// Unknown priorities (not representable here, but kept for parity with
    /// the spec's "unknown ⇒ 99" note on the free-form source data) would
    /// rank last.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

crate::simple_display! {
    Priority {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
