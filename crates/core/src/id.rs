// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic, role-prefixed ID minting.
//!
//! Unlike a random-ID scheme, task and group identifiers here are
//! `{PREFIX}-{N}` pairs minted from a per-prefix counter (§3.6, §6.6 of the
//! spec): `FEAT-001`, `CD-042`, `GRP-007`. The counter itself lives in
//! `MaterializedState` and is only ever touched under the Store's writer
//! lock, so two concurrent mints for the same prefix can never collide.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registry of `prefix -> next integer`, minted atomically by the caller
/// holding the Store's writer lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefixRegistry {
    next: HashMap<String, u64>,
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next ID for `prefix`, formatted as `{PREFIX}-{NNN}` (3-digit
    /// zero-padded, growing as needed past 999).
    pub fn mint(&mut self, prefix: &str) -> String {
        let counter = self.next.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}-{:03}", *counter)
    }

    /// Peek the next value that would be minted, without consuming it.
    pub fn peek_next(&self, prefix: &str) -> u64 {
        self.next.get(prefix).copied().unwrap_or(0) + 1
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
