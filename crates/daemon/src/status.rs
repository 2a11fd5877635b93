// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status cache and its read-only HTTP surface.
//!
//! The controller writes the latest snapshot per (dyad, member); the
//! surface renders them sorted by dyad then member rank. Entries whose
//! remaining percentage is unknown carry a note that classifies to an
//! emoji so a glance at `/status` explains why.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use sx_core::{usage::format_pct, Member, UsageSnapshot};

/// Latest observation for one dyad member.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub dyad: String,
    pub member: String,
    pub snapshot: UsageSnapshot,
    pub note: String,
    pub updated_at_ms: u64,
}

/// Shared cache of the controller's in-memory mirror.
#[derive(Clone, Default)]
pub struct StatusCache {
    inner: Arc<Mutex<HashMap<(String, String), StatusEntry>>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(
        &self,
        dyad: &str,
        member: Member,
        snapshot: UsageSnapshot,
        note: &str,
        now_ms: u64,
    ) {
        self.inner.lock().insert(
            (dyad.to_string(), member.to_string()),
            StatusEntry {
                dyad: dyad.to_string(),
                member: member.to_string(),
                snapshot,
                note: note.to_string(),
                updated_at_ms: now_ms,
            },
        );
    }

    /// Record a note with an unknown snapshot (probe failed, policy block).
    pub fn set_note(&self, dyad: &str, member: Member, note: &str, now_ms: u64) {
        self.set_snapshot(dyad, member, UsageSnapshot::unknown(), note, now_ms);
    }

    /// Mark both members of a dyad with the same note.
    pub fn mark_dyad(&self, dyad: &str, note: &str, now_ms: u64) {
        for member in Member::ALL {
            self.set_note(dyad, member, note, now_ms);
        }
    }

    /// Entries sorted ascending by dyad, then member rank (actor, critic,
    /// other).
    pub fn entries_sorted(&self) -> Vec<StatusEntry> {
        let mut entries: Vec<StatusEntry> = self.inner.lock().values().cloned().collect();
        entries.sort_by(|a, b| {
            a.dyad
                .cmp(&b.dyad)
                .then(Member::rank_label(&a.member).cmp(&Member::rank_label(&b.member)))
                .then(a.member.cmp(&b.member))
        });
        entries
    }
}

/// Classify an unknown-usage note to an emoji.
pub fn classify_note(note: &str) -> &'static str {
    let lower = note.to_lowercase();
    if lower.contains("auth required") {
        "🔑"
    } else if lower.contains("dyad not registered") {
        "🚫"
    } else if lower.contains("registry unavailable") {
        "⚠️"
    } else if lower.contains("missing") && lower.contains("container") {
        "📦"
    } else if lower.contains("timeout") {
        "⏱️"
    } else if lower.contains("connection refused") {
        "🔌"
    } else if lower.contains("no such host") {
        "🌐"
    } else {
        "❓"
    }
}

/// Plain-text rendering for `GET /status`.
pub fn render_text(entries: &[StatusEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let line = if entry.snapshot.short.is_known() {
            format!(
                "{:<16} {:<6} {:>7}  {:>5}m  weekly {:>7}  {}\n",
                entry.dyad,
                entry.member,
                format_pct(entry.snapshot.short.remaining_pct),
                entry.snapshot.short.remaining_minutes,
                format_pct(entry.snapshot.weekly.remaining_pct),
                entry.snapshot.email,
            )
        } else {
            format!(
                "{:<16} {:<6} {} {}\n",
                entry.dyad,
                entry.member,
                classify_note(&entry.note),
                entry.note,
            )
        };
        out.push_str(&line);
    }
    if out.is_empty() {
        out.push_str("no accounts polled yet\n");
    }
    out
}

#[derive(Serialize)]
struct StatusDoc {
    updated_at: String,
    accounts: Vec<StatusEntry>,
}

/// JSON rendering for `GET /status.json`.
pub fn render_json(entries: Vec<StatusEntry>, now_ms: u64) -> serde_json::Value {
    let updated_at = Utc
        .timestamp_millis_opt(now_ms as i64)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    serde_json::to_value(StatusDoc { updated_at, accounts: entries })
        .unwrap_or(serde_json::Value::Null)
}

async fn get_status(State(cache): State<StatusCache>) -> impl IntoResponse {
    render_text(&cache.entries_sorted())
}

async fn get_status_json(State(cache): State<StatusCache>) -> impl IntoResponse {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    axum::Json(render_json(cache.entries_sorted(), now_ms))
}

/// Router for the status surface (port 8086 by default).
pub fn status_router(cache: StatusCache) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/status.json", get(get_status_json))
        .with_state(cache)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
