// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Policy gate for dyad-task mutations.
//!
//! Every create/update/claim with a concrete dyad (not empty, not
//! `pool:<name>`) is checked against registration, availability, and the
//! per-dyad cap of open tasks. Violations map to 409 at the HTTP surface.

use std::collections::BTreeMap;
use sx_core::{is_pool_dyad, Dyad, DyadTask, TaskStatus};
use thiserror::Error;

/// Default per-dyad cap of non-done tasks.
pub const DEFAULT_MAX_OPEN_PER_DYAD: usize = 10;

/// Policy violations. The message text is the HTTP response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("dyad not registered")]
    NotRegistered,
    #[error("dyad unavailable")]
    Unavailable,
    #[error("dyad at capacity")]
    AtCapacity,
    #[error("unassigned tasks not allowed")]
    UnassignedNotAllowed,
    #[error("pool dyads not allowed")]
    PoolNotAllowed,
    #[error("status requires an assignment")]
    AssignmentRequired,
}

/// Policy switches, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub require_registered: bool,
    pub enforce_available: bool,
    pub max_open_per_dyad: usize,
    pub allow_unassigned: bool,
    pub allow_pool: bool,
    /// Refuse unassigned tasks outright, even in `todo`.
    pub require_assignment: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            require_registered: false,
            enforce_available: false,
            max_open_per_dyad: DEFAULT_MAX_OPEN_PER_DYAD,
            allow_unassigned: true,
            allow_pool: true,
            require_assignment: false,
        }
    }
}

impl PolicyConfig {
    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self {
            require_registered: crate::env::require_registered(),
            enforce_available: crate::env::enforce_available(),
            max_open_per_dyad: crate::env::max_open_per_dyad(),
            allow_unassigned: crate::env::allow_unassigned(),
            allow_pool: crate::env::allow_pool(),
            require_assignment: crate::env::require_assignment(),
        }
    }
}

/// Validate a task mutation.
///
/// `dyad` and `status` describe the task after the mutation. The task being
/// updated is excluded from its own dyad's cap via `exclude_task_id`; the
/// cap only applies when the mutation assigns the task to a new dyad
/// (`reassigning`).
pub fn check_task(
    policy: &PolicyConfig,
    dyads: &BTreeMap<String, Dyad>,
    tasks: &BTreeMap<u64, DyadTask>,
    dyad: &str,
    status: TaskStatus,
    exclude_task_id: Option<u64>,
    reassigning: bool,
) -> Result<(), PolicyViolation> {
    if dyad.is_empty() {
        if policy.require_assignment || !policy.allow_unassigned {
            return Err(PolicyViolation::UnassignedNotAllowed);
        }
        if status != TaskStatus::Todo && status != TaskStatus::Done {
            return Err(PolicyViolation::AssignmentRequired);
        }
        return Ok(());
    }

    if is_pool_dyad(dyad) {
        if !policy.allow_pool {
            return Err(PolicyViolation::PoolNotAllowed);
        }
        return Ok(());
    }

    if policy.require_registered && !dyads.contains_key(dyad) {
        return Err(PolicyViolation::NotRegistered);
    }

    if policy.enforce_available {
        if let Some(record) = dyads.get(dyad) {
            if !record.available {
                return Err(PolicyViolation::Unavailable);
            }
        }
    }

    if reassigning {
        let open = tasks
            .values()
            .filter(|t| t.dyad == dyad && t.is_open() && Some(t.id) != exclude_task_id)
            .count();
        if open >= policy.max_open_per_dyad {
            return Err(PolicyViolation::AtCapacity);
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
