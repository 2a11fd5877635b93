// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dyad records and the merge payload used to register/update them.
//!
//! A dyad is a pair of cooperating agents (actor and critic) identified by
//! a lowercase slug. The board keeps at most one record per slug; repeated
//! registrations merge non-empty fields into the existing record.

use serde::{Deserialize, Serialize};

/// The two members of a dyad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Member {
    Actor,
    Critic,
}

impl Member {
    pub const ALL: [Member; 2] = [Member::Actor, Member::Critic];

    /// Sort rank used by the status surface: actor first, critic second.
    /// Unknown member labels rank after both.
    pub fn rank_label(label: &str) -> u8 {
        match label {
            "actor" => 0,
            "critic" => 1,
            _ => 2,
        }
    }
}

crate::simple_display! {
    Member {
        Actor => "actor",
        Critic => "critic",
    }
}

/// A registered dyad on the board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dyad {
    pub dyad: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub assignment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Container reference for the actor member, when known.
    #[serde(default)]
    pub actor_container: String,
    /// Container reference for the critic member, when known.
    #[serde(default)]
    pub critic_container: String,
    /// Whether the dyad accepts new task assignments. Defaults to true on
    /// first registration.
    pub available: bool,
    /// Monotonic per dyad: merges never move it backwards.
    #[serde(default)]
    pub last_heartbeat_ms: u64,
    #[serde(default)]
    pub last_status: String,
    #[serde(default)]
    pub last_message: String,
}

/// Create-or-merge payload for a dyad record.
///
/// Non-empty fields overwrite; `available` only applies when explicitly set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DyadUpdate {
    #[serde(default)]
    pub dyad: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub assignment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub actor_container: String,
    #[serde(default)]
    pub critic_container: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default)]
    pub last_status: String,
    #[serde(default)]
    pub last_message: String,
}

impl Dyad {
    /// First registration from an update payload. Availability defaults to
    /// true unless the payload says otherwise.
    pub fn from_update(update: &DyadUpdate) -> Self {
        let mut dyad = Dyad {
            dyad: update.dyad.clone(),
            available: true,
            ..Dyad::default()
        };
        dyad.merge(update);
        dyad
    }

    /// Merge an update into this record: non-empty fields overwrite,
    /// `available` only when explicitly present.
    pub fn merge(&mut self, update: &DyadUpdate) {
        fn take(dst: &mut String, src: &str) {
            if !src.is_empty() {
                *dst = src.to_string();
            }
        }
        take(&mut self.department, &update.department);
        take(&mut self.role, &update.role);
        take(&mut self.team, &update.team);
        take(&mut self.assignment, &update.assignment);
        take(&mut self.actor_container, &update.actor_container);
        take(&mut self.critic_container, &update.critic_container);
        take(&mut self.last_status, &update.last_status);
        take(&mut self.last_message, &update.last_message);
        if !update.tags.is_empty() {
            self.tags = update.tags.clone();
        }
        if let Some(available) = update.available {
            self.available = available;
        }
    }

    /// Record a heartbeat, keeping `last_heartbeat_ms` monotonic.
    pub fn beat(&mut self, at_ms: u64, status: &str, message: &str) {
        if at_ms > self.last_heartbeat_ms {
            self.last_heartbeat_ms = at_ms;
        }
        if !status.is_empty() {
            self.last_status = status.to_string();
        }
        if !message.is_empty() {
            self.last_message = message.to_string();
        }
    }
}

#[cfg(test)]
#[path = "dyad_tests.rs"]
mod tests;
