// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dyad-task signal handlers: add, update, claim.

use super::state::{Applied, BoardState};
use super::BoardError;
use crate::policy::{self, PolicyConfig};
use sx_core::{DyadTask, TaskPatch, TaskStatus};

pub(super) fn add(
    state: &mut BoardState,
    mut task: DyadTask,
    now_ms: u64,
    policy: &PolicyConfig,
) -> Result<Applied, BoardError> {
    if task.title.trim().is_empty() {
        return Err(BoardError::Invalid("title required".to_string()));
    }

    policy::check_task(
        policy,
        &state.dyads,
        &state.dyad_tasks,
        &task.dyad,
        task.status,
        None,
        !task.dyad.is_empty(),
    )
    .map_err(|v| BoardError::Conflict(v.to_string()))?;

    state.next_task_id += 1;
    task.id = state.next_task_id;
    task.created_at_ms = now_ms;
    task.updated_at_ms = now_ms;
    task.chat_message_id = 0;
    state.dyad_tasks.insert(task.id, task.clone());
    Ok(Applied::DyadTask { task, notify: true })
}

pub(super) fn update(
    state: &mut BoardState,
    patch: TaskPatch,
    now_ms: u64,
    policy: &PolicyConfig,
) -> Result<Applied, BoardError> {
    let existing = state
        .dyad_tasks
        .get(&patch.id)
        .cloned()
        .ok_or_else(|| BoardError::NotFound(format!("no task {}", patch.id)))?;

    let new_dyad =
        if patch.dyad.is_empty() { existing.dyad.clone() } else { patch.dyad.clone() };
    let new_status = patch.status.unwrap_or(existing.status);
    let reassigning = !patch.dyad.is_empty() && patch.dyad != existing.dyad;

    policy::check_task(
        policy,
        &state.dyads,
        &state.dyad_tasks,
        &new_dyad,
        new_status,
        Some(existing.id),
        reassigning,
    )
    .map_err(|v| BoardError::Conflict(v.to_string()))?;

    let mut task = existing;
    let changed = patch.apply_to(&mut task);

    // A writeback that only moves the chat anchor must not re-trigger the
    // notifier, or the projector would chase its own updates.
    let beyond_anchor = {
        let anchorless = TaskPatch { chat_message_id: None, ..patch.clone() };
        let mut probe = state.dyad_tasks[&task.id].clone();
        anchorless.apply_to(&mut probe)
    };

    if changed {
        task.updated_at_ms = now_ms;
        state.dyad_tasks.insert(task.id, task.clone());
    }

    Ok(Applied::DyadTask { task, notify: changed && beyond_anchor })
}

pub(super) fn claim(
    state: &mut BoardState,
    id: u64,
    dyad: &str,
    critic: &str,
    now_ms: u64,
    policy: &PolicyConfig,
) -> Result<Applied, BoardError> {
    if critic.is_empty() {
        return Err(BoardError::Invalid("critic required".to_string()));
    }

    let task = state
        .dyad_tasks
        .get(&id)
        .cloned()
        .ok_or_else(|| BoardError::NotFound(format!("no task {}", id)))?;

    if task.status.is_done() {
        return Err(BoardError::Conflict("task is done".to_string()));
    }
    if !task.dyad.is_empty() && task.dyad != dyad {
        return Err(BoardError::Conflict("task belongs to another dyad".to_string()));
    }
    if state.lease_held_against(&task, critic, now_ms) {
        return Err(BoardError::Conflict("task claimed by another critic".to_string()));
    }

    let assigning = task.dyad.is_empty() && !dyad.is_empty();
    policy::check_task(
        policy,
        &state.dyads,
        &state.dyad_tasks,
        if assigning { dyad } else { &task.dyad },
        task.status,
        Some(task.id),
        assigning,
    )
    .map_err(|v| BoardError::Conflict(v.to_string()))?;

    let mut task = task;
    if assigning {
        task.dyad = dyad.to_string();
    }
    let new_owner = task.claimed_by != critic;
    if new_owner {
        task.claimed_by = critic.to_string();
        task.claimed_at_ms = now_ms;
    }
    task.heartbeat_at_ms = now_ms;
    if task.status == TaskStatus::Todo {
        task.status = TaskStatus::InProgress;
    }
    task.updated_at_ms = now_ms;
    state.dyad_tasks.insert(task.id, task.clone());
    Ok(Applied::DyadTask { task, notify: true })
}
