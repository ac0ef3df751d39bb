// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery (§4.1).
//!
//! A snapshot captures the complete materialized state at a WAL sequence
//! number. Recovery loads the snapshot and replays WAL entries after it.

use crate::error::SnapshotError;
use crate::migration::MigrationRegistry;
use crate::state::MaterializedState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState, created_at: DateTime<Utc>) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at }
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path, registry: &MigrationRegistry) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(path)?;
        let value: serde_json::Value = serde_json::from_slice(&raw)?;
        let migrated = registry.migrate_to(value, CURRENT_SNAPSHOT_VERSION)?;
        Ok(Some(serde_json::from_value(migrated)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_core::{Group, GroupStatus};
    use tempfile::tempdir;

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let mut state = MaterializedState::default();
        state.groups.insert(
            "FEAT-001".into(),
            Group { id: "FEAT-001".into(), title: "t".into(), origin: "o".into(), status: GroupStatus::Active, created_by: "pm".into(), created_at: Utc::now(), completed_at: None },
        );
        let snapshot = Snapshot::new(5, state, Utc::now());
        snapshot.save(&path).unwrap();

        let registry = MigrationRegistry::new();
        let loaded = Snapshot::load(&path, &registry).unwrap().unwrap();
        assert_eq!(loaded.seq, 5);
        assert!(loaded.state.groups.contains_key("FEAT-001"));
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let registry = MigrationRegistry::new();
        assert!(Snapshot::load(&path, &registry).unwrap().is_none());
    }
}
