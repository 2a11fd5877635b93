// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only record types: heartbeats, feedback, access requests, metrics.
//!
//! All ids and timestamps are assigned by the board when the record is
//! appended; values supplied by clients are ignored.

use serde::{Deserialize, Serialize};

/// Heartbeats are kept in a ring capped at this many entries.
pub const BEATS_RING_CAP: usize = 1000;

/// A liveness beat from a dyad member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub dyad: String,
    #[serde(default)]
    pub member: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub at_ms: u64,
}

/// Severity of a feedback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    Severity {
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

/// Operator-visible feedback raised by dyads or the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub dyad: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub at_ms: u64,
}

/// Status of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

impl AccessStatus {
    /// Parse a resolution status from a query parameter. Only the two
    /// terminal states are valid resolutions.
    pub fn parse_resolution(s: &str) -> Option<AccessStatus> {
        match s {
            "approved" => Some(AccessStatus::Approved),
            "denied" => Some(AccessStatus::Denied),
            _ => None,
        }
    }
}

crate::simple_display! {
    AccessStatus {
        Pending => "pending",
        Approved => "approved",
        Denied => "denied",
    }
}

/// A request for elevated access, resolved by a human.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: AccessStatus,
    #[serde(default)]
    pub resolved_by: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub at_ms: u64,
    #[serde(default)]
    pub resolved_at_ms: u64,
}

/// A named metric sample forwarded to the manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub dyad: String,
    #[serde(default)]
    pub labels: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub at_ms: u64,
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
