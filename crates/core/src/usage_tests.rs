// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn from_used_computes_complement_and_minutes() {
    let window = UsageWindow::from_used(75.0, Some(300.0));
    assert_eq!(window.remaining_pct, 25.0);
    assert_eq!(window.remaining_minutes, 75);
    assert_eq!(window.used_pct, 75.0);
}

#[test]
fn from_used_without_duration_has_zero_minutes() {
    let window = UsageWindow::from_used(40.0, None);
    assert_eq!(window.remaining_pct, 60.0);
    assert_eq!(window.remaining_minutes, 0);
}

#[test]
fn from_used_clamps_out_of_range() {
    assert_eq!(UsageWindow::from_used(120.0, None).remaining_pct, 0.0);
    assert_eq!(UsageWindow::from_used(-5.0, None).remaining_pct, 100.0);
}

#[yare::parameterized(
    at_zero        = { 0.0, true },
    at_threshold   = { 10.0, true },
    above          = { 10.1, false },
    healthy        = { 85.0, false },
    unknown        = { UNKNOWN_PCT, false },
)]
fn cooldown_boundary(remaining: f64, expected: bool) {
    let snapshot = UsageSnapshot {
        short: UsageWindow { remaining_pct: remaining, remaining_minutes: 0, used_pct: UNKNOWN_PCT },
        ..UsageSnapshot::default()
    };
    assert_eq!(snapshot.cooldown(10.0), expected);
}

#[test]
fn enrich_fills_only_missing_fields() {
    let mut snapshot = UsageSnapshot { model: "gpt-4.1".to_string(), ..UsageSnapshot::default() };
    snapshot.enrich_from(&UsageSnapshot {
        model: "other".to_string(),
        reasoning_effort: "medium".to_string(),
        session_id: "s-1".to_string(),
        ..UsageSnapshot::default()
    });
    assert_eq!(snapshot.model, "gpt-4.1");
    assert_eq!(snapshot.reasoning_effort, "medium");
    assert_eq!(snapshot.session_id, "s-1");
}

#[yare::parameterized(
    one_decimal = { 25.0, "25.0%" },
    rounded     = { 33.333, "33.3%" },
    unknown     = { UNKNOWN_PCT, "-" },
)]
fn pct_rendering(pct: f64, expected: &str) {
    assert_eq!(format_pct(pct), expected);
}
