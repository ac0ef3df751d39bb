// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_both_instant_and_utc() {
    let clock = FakeClock::new();
    let before_instant = clock.now();
    let before_utc = clock.utc_now();

    clock.advance(Duration::from_secs(60));

    assert!(clock.now() > before_instant);
    assert!(clock.utc_now() > before_utc);
    assert_eq!(clock.utc_now() - before_utc, chrono::Duration::seconds(60));
}

#[test]
fn fake_clock_set_utc_is_observable() {
    let clock = FakeClock::new();
    let target = DateTime::UNIX_EPOCH + chrono::Duration::days(1);
    clock.set_utc(target);
    assert_eq!(clock.utc_now(), target);
}
