// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller configuration, reloaded from the accounts file on every poll.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use sx_core::AccountDescriptor;
use thiserror::Error;

/// Default controller poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);
/// Default cooldown threshold percentage.
pub const DEFAULT_COOLDOWN_THRESHOLD_PCT: f64 = 10.0;

/// Errors from config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accounts config file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default)]
    pub accounts: Vec<AccountDescriptor>,
    #[serde(default)]
    pub cooldown_threshold_pct: f64,
    #[serde(default)]
    pub total_limit_minutes: u64,
    /// Duration string like "30s" / "2m"; empty or invalid falls back.
    #[serde(default)]
    pub poll_interval: String,
}

impl AccountsConfig {
    /// Load from a JSON file. A missing file yields the empty config.
    pub fn load(path: &Path) -> Result<AccountsConfig, ConfigError> {
        if !path.exists() {
            return Ok(AccountsConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Poll interval with the 2-minute fallback.
    pub fn poll_interval(&self) -> Duration {
        parse_duration(&self.poll_interval).unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Cooldown threshold; non-positive values keep the default 10%.
    pub fn cooldown_threshold(&self) -> f64 {
        if self.cooldown_threshold_pct > 0.0 {
            self.cooldown_threshold_pct
        } else {
            DEFAULT_COOLDOWN_THRESHOLD_PCT
        }
    }
}

/// Parse a duration string like "30s", "5m", "1h" into a Duration
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the numeric prefix
    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
