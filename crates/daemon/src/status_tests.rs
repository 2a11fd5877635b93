// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sx_core::{UsageWindow, UNKNOWN_PCT};

fn snapshot(remaining: f64) -> UsageSnapshot {
    UsageSnapshot {
        short: UsageWindow { remaining_pct: remaining, remaining_minutes: 10, used_pct: 100.0 - remaining },
        ..UsageSnapshot::default()
    }
}

#[test]
fn entries_sort_by_dyad_then_member_rank() {
    let cache = StatusCache::new();
    cache.set_snapshot("beta", Member::Critic, snapshot(50.0), "", 1);
    cache.set_snapshot("alpha", Member::Critic, snapshot(50.0), "", 1);
    cache.set_snapshot("alpha", Member::Actor, snapshot(50.0), "", 1);

    let keys: Vec<(String, String)> = cache
        .entries_sorted()
        .into_iter()
        .map(|e| (e.dyad, e.member))
        .collect();
    assert_eq!(
        keys,
        [
            ("alpha".to_string(), "actor".to_string()),
            ("alpha".to_string(), "critic".to_string()),
            ("beta".to_string(), "critic".to_string()),
        ]
    );
}

#[test]
fn latest_write_wins_per_member() {
    let cache = StatusCache::new();
    cache.set_snapshot("alpha", Member::Actor, snapshot(50.0), "", 1);
    cache.set_snapshot("alpha", Member::Actor, snapshot(25.0), "", 2);

    let entries = cache.entries_sorted();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].snapshot.short.remaining_pct, 25.0);
    assert_eq!(entries[0].updated_at_ms, 2);
}

#[yare::parameterized(
    auth       = { "auth required", "🔑" },
    unregistered = { "dyad not registered", "🚫" },
    registry   = { "dyad registry unavailable", "⚠️" },
    container  = { "missing alpha actor container", "📦" },
    timeout    = { "timeout", "⏱️" },
    refused    = { "connection refused", "🔌" },
    dns        = { "no such host", "🌐" },
    other      = { "something odd", "❓" },
)]
fn note_classification(note: &str, emoji: &str) {
    assert_eq!(classify_note(note), emoji);
}

#[test]
fn text_render_shows_one_decimal_percent() {
    let cache = StatusCache::new();
    cache.set_snapshot("alpha", Member::Critic, snapshot(33.333), "", 1);
    let text = render_text(&cache.entries_sorted());
    assert!(text.contains("33.3%"), "got: {text}");
}

#[test]
fn text_render_shows_emoji_for_unknown() {
    let cache = StatusCache::new();
    cache.set_note("alpha", Member::Critic, "auth required", 1);
    let text = render_text(&cache.entries_sorted());
    assert!(text.contains("🔑"));
    assert!(text.contains("auth required"));
}

#[test]
fn mark_dyad_covers_both_members() {
    let cache = StatusCache::new();
    cache.mark_dyad("alpha", "dyad registry unavailable", 5);
    let entries = cache.entries_sorted();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.note == "dyad registry unavailable"));
    assert!(entries.iter().all(|e| e.snapshot.short.remaining_pct == UNKNOWN_PCT));
}

#[test]
fn json_render_has_updated_at_and_accounts() {
    let cache = StatusCache::new();
    cache.set_snapshot("alpha", Member::Actor, snapshot(80.0), "", 1);
    let doc = render_json(cache.entries_sorted(), 1_700_000_000_000);
    assert!(doc["updated_at"].as_str().unwrap().starts_with("2023-"));
    assert_eq!(doc["accounts"].as_array().unwrap().len(), 1);
}
