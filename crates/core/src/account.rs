// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account descriptors from the accounts config file.
//!
//! Each descriptor pairs an upstream assistant account with the dyad whose
//! containers consume its quota. The controller polls usage for both members
//! but emits manager metrics only for the monitored one.

use crate::dyad::Member;
use serde::{Deserialize, Serialize};

/// Which member's usage feeds the manager metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MonitorTarget {
    Actor,
    #[default]
    Critic,
}

impl MonitorTarget {
    pub fn member(self) -> Member {
        match self {
            MonitorTarget::Actor => Member::Actor,
            MonitorTarget::Critic => Member::Critic,
        }
    }

    /// Parse a config label; anything unknown coerces to critic.
    pub fn parse(label: &str) -> MonitorTarget {
        match label {
            "actor" => MonitorTarget::Actor,
            _ => MonitorTarget::Critic,
        }
    }
}

// Unknown labels coerce instead of erroring, so one bad entry cannot take
// the whole accounts file down.
impl<'de> Deserialize<'de> for MonitorTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(MonitorTarget::parse(&label))
    }
}

crate::simple_display! {
    MonitorTarget {
        Actor => "actor",
        Critic => "critic",
    }
}

fn default_true() -> bool {
    true
}

/// One entry of the accounts config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDescriptor {
    /// Upstream account name (informational, shows in logs and status).
    #[serde(default)]
    pub name: String,
    /// Dyad slug this account serves. Required: entries with a blank dyad
    /// are skipped by the controller.
    #[serde(default)]
    pub dyad: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    /// Which member's usage feeds manager metrics. Unknown labels coerce
    /// to critic at parse time.
    #[serde(default)]
    pub monitor: MonitorTarget,
    /// Container-name overrides, keyed like the member labels.
    #[serde(default)]
    pub actor_container: String,
    #[serde(default)]
    pub critic_container: String,
    /// Assistant profile dir on the local filesystem, enabling the
    /// subprocess probe without going through the container.
    #[serde(default)]
    pub home_dir: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the controller may create the container pair when missing.
    #[serde(default = "default_true")]
    pub spawn: bool,
}

impl AccountDescriptor {
    /// Resolve the container name for a member, honoring overrides.
    pub fn container_name(&self, member: Member) -> String {
        let override_name = match member {
            Member::Actor => &self.actor_container,
            Member::Critic => &self.critic_container,
        };
        if !override_name.is_empty() {
            return override_name.clone();
        }
        format!("silexa-{}-{}", member, self.dyad)
    }
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
