// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned snapshot migrations (§4.1 Failure model).

use crate::error::MigrationError;
use serde_json::Value;

pub trait Migration {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError>;
}

pub struct MigrationRegistry {
    pub(crate) migrations: Vec<Box<dyn Migration>>,
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self { migrations: Vec::new() }
    }

    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Migrate a raw snapshot JSON value to `target_version`, refusing to
    /// load a snapshot newer than this binary understands.
    pub fn migrate_to(&self, mut snapshot: Value, target_version: u32) -> Result<Value, MigrationError> {
        let mut current = snapshot["v"].as_u64().unwrap_or(0) as u32;

        if current > target_version {
            return Err(MigrationError::TooNew(current, target_version));
        }

        while current < target_version {
            let step = self
                .migrations
                .iter()
                .find(|m| m.source_version() == current)
                .ok_or(MigrationError::NoPath(current, target_version))?;
            step.migrate(&mut snapshot)?;
            current = step.target_version();
            snapshot["v"] = current.into();
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn migrate_same_version_is_noop() {
        let v1 = json!({"v": 1, "seq": 1, "state": {}});
        let registry = MigrationRegistry::new();
        let result = registry.migrate_to(v1.clone(), 1).unwrap();
        assert_eq!(result, v1);
    }

    #[test]
    fn too_new_is_rejected() {
        let v99 = json!({"v": 99, "seq": 1, "state": {}});
        let registry = MigrationRegistry::new();
        assert_eq!(registry.migrate_to(v99, 1), Err(MigrationError::TooNew(99, 1)));
    }

    #[test]
    fn missing_path_is_rejected() {
        let v1 = json!({"v": 1, "seq": 1, "state": {}});
        let registry = MigrationRegistry::new();
        assert_eq!(registry.migrate_to(v1, 2), Err(MigrationError::NoPath(1, 2)));
    }

    struct MockV1ToV2;

    impl Migration for MockV1ToV2 {
        fn source_version(&self) -> u32 {
            1
        }
        fn target_version(&self) -> u32 {
            2
        }
        fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError> {
            if let Some(obj) = snapshot.as_object_mut() {
                obj.insert("migrated".into(), true.into());
            }
            Ok(())
        }
    }

    #[test]
    fn migration_chain_runs_and_bumps_version() {
        let mut registry = MigrationRegistry::new();
        registry.register(Box::new(MockV1ToV2));

        let v1 = json!({"v": 1, "seq": 42, "state": {}});
        let result = registry.migrate_to(v1, 2).unwrap();

        assert_eq!(result["v"], 2);
        assert_eq!(result["seq"], 42);
        assert_eq!(result["migrated"], true);
    }
}
