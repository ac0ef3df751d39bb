// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The static role set (§3.7, §9.1): roles are built in code at startup,
//! never parsed from a config file.

use ob_core::{AutoScaleConfig, ContextKind, Role, RoutingMode};
use std::collections::HashMap;

/// The default pm → architect → coder → verifier pipeline (Glossary).
pub fn default_roles() -> Vec<Role> {
    vec![
        Role {
            name: "pm".to_string(),
            display_name: "Product Manager".to_string(),
            prefix: "PM".to_string(),
            can_create_groups: true,
            routes_to: vec![("design".to_string(), "architect".to_string())],
            context_includes: vec![],
            routing_mode: RoutingMode::Closed,
            max_instances: 2,
            auto_scale: AutoScaleConfig { enabled: false, ..AutoScaleConfig::default() },
            max_execution_time: None,
        },
        Role {
            name: "architect".to_string(),
            display_name: "Architect".to_string(),
            prefix: "AR".to_string(),
            can_create_groups: false,
            routes_to: vec![("implement".to_string(), "coder".to_string())],
            context_includes: vec![ContextKind::ParentArtifact],
            routing_mode: RoutingMode::Closed,
            max_instances: 3,
            auto_scale: AutoScaleConfig::default(),
            max_execution_time: None,
        },
        Role {
            name: "coder".to_string(),
            display_name: "Coder".to_string(),
            prefix: "CD".to_string(),
            can_create_groups: false,
            routes_to: vec![("verify".to_string(), "verifier".to_string())],
            context_includes: vec![ContextKind::ParentArtifact],
            routing_mode: RoutingMode::Closed,
            max_instances: 8,
            auto_scale: AutoScaleConfig::default(),
            max_execution_time: Some(std::time::Duration::from_secs(1800)),
        },
        Role {
            name: "verifier".to_string(),
            display_name: "Verifier".to_string(),
            prefix: "VF".to_string(),
            can_create_groups: false,
            routes_to: vec![],
            context_includes: vec![ContextKind::ParentArtifact],
            routing_mode: RoutingMode::Closed,
            max_instances: 4,
            auto_scale: AutoScaleConfig::default(),
            max_execution_time: Some(std::time::Duration::from_secs(600)),
        },
    ]
}

pub fn roles_by_name(roles: &[Role]) -> HashMap<String, Role> {
    roles.iter().map(|r| (r.name.clone(), r.clone())).collect()
}
