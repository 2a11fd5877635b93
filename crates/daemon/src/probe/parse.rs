// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Usage-text parsing.
//!
//! Two input shapes produce a [`UsageSnapshot`]:
//!
//! - structured `rateLimits` payloads from the assistant's app-server
//! - scraped terminal or CLI text, parsed heuristically line by line
//!
//! The heuristic parser classifies each ANSI-stripped line by its context
//! words (remaining/used) and a weekly marker, so weekly lines can never
//! bleed into the short window or vice versa.

use sx_core::{UsageSnapshot, UsageWindow, UNKNOWN_PCT};

/// Strip ANSI escapes and invisible control characters.
pub fn strip_ansi(text: &[u8]) -> String {
    let stripped = strip_ansi_escapes::strip(text);
    let text = String::from_utf8_lossy(&stripped);
    text.chars().filter(|c| !c.is_control() || *c == '\n' || *c == '\t').collect()
}

/// Canonicalize an email that terminals render with stray spaces:
/// `jane @ example . com` becomes `jane@example.com`.
pub fn canonicalize_email(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Minutes from `<h>h <m>m` style tokens: "1h 15m" → 75, "45m" → 45.
pub fn parse_hours_minutes(text: &str) -> Option<u64> {
    let mut total: Option<u64> = None;
    let mut number = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else if (c == 'h' || c == 'm') && !number.is_empty() {
            let value: u64 = number.parse().ok()?;
            let minutes = if c == 'h' { value * 60 } else { value };
            total = Some(total.unwrap_or(0) + minutes);
            number.clear();
        } else {
            number.clear();
        }
    }
    total
}

/// All `NN%` / `NN.N%` tokens on a line.
fn find_percents(line: &str) -> Vec<f64> {
    let mut out = Vec::new();
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        // Walk back over the numeric token.
        let mut start = i;
        while start > 0 {
            let c = bytes[start - 1];
            if c.is_ascii_digit() || c == b'.' {
                start -= 1;
            } else {
                break;
            }
        }
        if start < i {
            if let Ok(value) = line[start..i].parse::<f64>() {
                out.push(value);
            }
        }
    }
    out
}

fn is_weekly_line(lower: &str) -> bool {
    lower.contains("weekly")
        || lower.contains("week")
        || lower.contains("7-day")
        || lower.contains("7 day")
        || lower.contains("7day")
}

/// Extract `Model: gpt-4.1 (Reasoning level: medium)` style lines.
fn parse_model_line(line: &str) -> Option<(String, String)> {
    let lower = line.to_lowercase();
    let idx = lower.find("model:")?;
    // Index into the original line: lowercase can shift byte offsets for
    // non-ASCII output, so fall back to a boundary-safe slice.
    let rest = line.get(idx + "model:".len()..)?.trim();
    if let Some(open) = rest.find('(') {
        let model = rest[..open].trim().to_string();
        let inner = rest[open + 1..].trim_end_matches(')');
        let effort = inner
            .to_lowercase()
            .find("reasoning")
            .map(|_| inner.rsplit(':').next().unwrap_or("").trim().to_string())
            .unwrap_or_default();
        Some((model, effort))
    } else {
        Some((rest.to_string(), String::new()))
    }
}

/// Parse scraped or CLI usage text into a snapshot.
///
/// `total_limit_minutes` converts a bare short-window percentage into
/// minutes when the text carries no duration of its own.
pub fn parse_usage_text(raw: &[u8], total_limit_minutes: u64) -> UsageSnapshot {
    let text = strip_ansi(raw);
    let mut snapshot = UsageSnapshot::unknown();
    // Per window: remaining pct, used pct, explicit minutes.
    let mut short = (UNKNOWN_PCT, UNKNOWN_PCT, None::<u64>);
    let mut weekly = (UNKNOWN_PCT, UNKNOWN_PCT, None::<u64>);

    for line in text.lines() {
        let lower = line.to_lowercase();

        if lower.contains("signed in as") || lower.contains("account:") {
            if let Some(at) = line.find(':') {
                let candidate = &line[at + 1..];
                if candidate.contains('@') {
                    snapshot.email = canonicalize_email(candidate);
                }
            }
        } else if snapshot.email.is_empty() && line.contains('@') && !lower.contains('%') {
            // A bare address line, possibly space-broken by the terminal.
            let candidate = canonicalize_email(line);
            if candidate.contains('@') && candidate.contains('.') {
                snapshot.email = candidate;
            }
        }

        if snapshot.model.is_empty() {
            if let Some((model, effort)) = parse_model_line(line) {
                snapshot.model = model;
                if snapshot.reasoning_effort.is_empty() {
                    snapshot.reasoning_effort = effort;
                }
            }
        }
        if snapshot.reasoning_effort.is_empty() && lower.contains("reasoning effort") {
            if let Some(idx) = line.rfind(':') {
                snapshot.reasoning_effort = line[idx + 1..].trim().to_lowercase();
            }
        }
        if snapshot.session_id.is_empty() && lower.contains("session") {
            if let Some(idx) = line.rfind(':') {
                let id = line[idx + 1..].trim();
                if !id.is_empty() && !id.contains(' ') {
                    snapshot.session_id = id.to_string();
                }
            }
        }

        let percents = find_percents(line);
        if percents.is_empty() {
            continue;
        }
        let window = if is_weekly_line(&lower) { &mut weekly } else { &mut short };
        let minutes = parse_hours_minutes(line);
        let has_remaining = lower.contains("remaining") || lower.contains("left");
        let has_used = lower.contains("used");

        if has_remaining {
            window.0 = percents[0];
            if minutes.is_some() {
                window.2 = minutes;
            }
        } else if has_used {
            window.1 = percents[0];
        } else if percents.len() == 1 {
            // One unqualified percent and no classifier: treat as remaining.
            window.0 = percents[0];
            if minutes.is_some() {
                window.2 = minutes;
            }
        }
    }

    snapshot.short = resolve_window(short, Some(total_limit_minutes).filter(|m| *m > 0));
    snapshot.weekly = resolve_window(weekly, None);
    snapshot
}

/// Collapse (remaining, used, minutes) observations into a window.
fn resolve_window(
    (remaining, used, minutes): (f64, f64, Option<u64>),
    fallback_total: Option<u64>,
) -> UsageWindow {
    let remaining = if remaining >= 0.0 {
        remaining
    } else if used >= 0.0 {
        100.0 - used
    } else {
        UNKNOWN_PCT
    };

    if remaining < 0.0 {
        return UsageWindow::default();
    }

    let remaining_minutes = minutes.unwrap_or_else(|| {
        fallback_total
            .map(|total| (total as f64 * remaining / 100.0).round() as u64)
            .unwrap_or(0)
    });

    UsageWindow {
        remaining_pct: remaining,
        remaining_minutes,
        used_pct: if used >= 0.0 { used } else { 100.0 - remaining },
    }
}

/// Parse an app-server `rateLimits` payload.
///
/// Each window is `{usedPercent, windowDurationMins?, resetsAt?}`;
/// `primary` feeds the short window, `secondary` the weekly one.
pub fn parse_rate_limits(payload: &serde_json::Value) -> (UsageWindow, UsageWindow) {
    let limits = payload.get("rateLimits").unwrap_or(payload);
    let window = |name: &str| -> UsageWindow {
        match limits.get(name) {
            Some(w) => {
                let used = match w.get("usedPercent").and_then(|v| v.as_f64()) {
                    Some(used) => used,
                    None => return UsageWindow::default(),
                };
                let duration = w.get("windowDurationMins").and_then(|v| v.as_f64());
                UsageWindow::from_used(used, duration)
            }
            None => UsageWindow::default(),
        }
    };
    (window("primary"), window("secondary"))
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
