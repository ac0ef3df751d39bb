// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn mint_starts_at_one_and_zero_pads() {
    let mut reg = PrefixRegistry::new();
    assert_eq!(reg.mint("CD"), "CD-001");
    assert_eq!(reg.mint("CD"), "CD-002");
}

#[test]
fn mint_is_independent_per_prefix() {
    let mut reg = PrefixRegistry::new();
    assert_eq!(reg.mint("CD"), "CD-001");
    assert_eq!(reg.mint("GRP"), "GRP-001");
    assert_eq!(reg.mint("CD"), "CD-002");
}

#[test]
fn mint_grows_past_three_digits() {
    let mut reg = PrefixRegistry::new();
    for _ in 0..1000 {
        reg.mint("CD");
    }
    assert_eq!(reg.mint("CD"), "CD-1001");
}

#[test]
fn peek_next_does_not_consume() {
    let mut reg = PrefixRegistry::new();
    assert_eq!(reg.peek_next("CD"), 1);
    reg.mint("CD");
    assert_eq!(reg.peek_next("CD"), 2);
    assert_eq!(reg.peek_next("CD"), 2);
}

#[cfg(feature = "test-support")]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mint_is_strictly_increasing(n in 1usize..200) {
            let mut reg = PrefixRegistry::new();
            let mut last = 0u64;
            for _ in 0..n {
                let id = reg.mint("X");
                let suffix: u64 = id.strip_prefix("X-").unwrap().parse().unwrap();
                prop_assert!(suffix > last);
                last = suffix;
            }
        }
    }
}
