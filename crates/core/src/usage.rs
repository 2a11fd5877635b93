// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remaining-quota telemetry extracted from the upstream assistant.
//!
//! Percentages live in `[0, 100]` with `-1.0` as the "unknown" sentinel.
//! Two windows are tracked: the short rolling window and the weekly window.

use serde::{Deserialize, Serialize};

/// Sentinel for "we could not determine this percentage".
pub const UNKNOWN_PCT: f64 = -1.0;

/// One usage window: remaining/used percentages plus remaining minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub remaining_pct: f64,
    pub remaining_minutes: u64,
    pub used_pct: f64,
}

impl Default for UsageWindow {
    fn default() -> Self {
        Self { remaining_pct: UNKNOWN_PCT, remaining_minutes: 0, used_pct: UNKNOWN_PCT }
    }
}

impl UsageWindow {
    /// Build a window from a used percentage and an optional window duration
    /// in minutes. Remaining minutes are 0 when the duration is unknown.
    pub fn from_used(used_pct: f64, window_minutes: Option<f64>) -> Self {
        let used = used_pct.clamp(0.0, 100.0);
        let remaining = 100.0 - used;
        let remaining_minutes = window_minutes
            .map(|mins| (mins * remaining / 100.0).round().max(0.0) as u64)
            .unwrap_or(0);
        Self { remaining_pct: remaining, remaining_minutes, used_pct: used }
    }

    pub fn is_known(&self) -> bool {
        self.remaining_pct >= 0.0
    }
}

/// A snapshot of account usage at one probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    #[serde(default)]
    pub short: UsageWindow,
    #[serde(default)]
    pub weekly: UsageWindow,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub reasoning_effort: String,
    #[serde(default)]
    pub session_id: String,
}

impl UsageSnapshot {
    /// A snapshot with both windows unknown.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Cooldown holds iff the short-window remaining percentage is known
    /// and at or below the threshold.
    pub fn cooldown(&self, threshold_pct: f64) -> bool {
        self.short.remaining_pct >= 0.0 && self.short.remaining_pct <= threshold_pct
    }

    /// Merge non-empty identity fields from another snapshot (scrape
    /// enrichment: model, effort, session, email).
    pub fn enrich_from(&mut self, other: &UsageSnapshot) {
        fn take(dst: &mut String, src: &str) {
            if dst.is_empty() && !src.is_empty() {
                *dst = src.to_string();
            }
        }
        take(&mut self.email, &other.email);
        take(&mut self.model, &other.model);
        take(&mut self.reasoning_effort, &other.reasoning_effort);
        take(&mut self.session_id, &other.session_id);
    }
}

/// Render a percentage to one decimal, or a dash for the unknown sentinel.
pub fn format_pct(pct: f64) -> String {
    if pct < 0.0 {
        "-".to_string()
    } else {
        format!("{:.1}%", pct)
    }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
