// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    critical = { Priority::Critical, 0 },
    high     = { Priority::High,     1 },
    medium   = { Priority::Medium,   2 },
    low      = { Priority::Low,      3 },
)]
fn rank_matches_fixed_ordering(priority: Priority, expected: u8) {
    assert_eq!(priority.rank(), expected);
}

#[test]
fn ordering_is_critical_first() {
    let mut all = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
    all.sort_by_key(|p| p.rank());
    assert_eq!(all, vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]);
}

#[test]
fn default_is_medium() {
    assert_eq!(Priority::default(), Priority::Medium);
}

#[test]
fn display_matches_wire_format() {
    assert_eq!(Priority::Critical.to_string(), "critical");
    assert_eq!(Priority::Low.to_string(), "low");
}

#[test]
fn roundtrips_through_json() {
    for p in [Priority::Critical, Priority::High, Priority::Medium, Priority::Low] {
        let json = serde_json::to_string(&p).unwrap();
        let parsed: Priority = serde_json::from_str(&json).unwrap();
        assert_eq!(p, parsed);
    }
}
