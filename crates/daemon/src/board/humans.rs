// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-task signal handlers.

use super::state::{Applied, BoardState};
use super::BoardError;
use sx_core::{HumanTask, HumanTaskStatus};

pub(super) fn add(
    state: &mut BoardState,
    mut task: HumanTask,
    now_ms: u64,
) -> Result<Applied, BoardError> {
    if task.title.trim().is_empty() {
        return Err(BoardError::Invalid("title required".to_string()));
    }
    if task.commands.trim().is_empty() {
        return Err(BoardError::Invalid("commands required".to_string()));
    }

    state.next_human_task_id += 1;
    task.id = state.next_human_task_id;
    task.status = HumanTaskStatus::Open;
    task.created_at_ms = now_ms;
    task.updated_at_ms = now_ms;
    state.human_tasks.insert(task.id, task.clone());
    Ok(Applied::HumanTask(task))
}

/// Completing twice is a no-op: the second call returns the already-done
/// record unchanged.
pub(super) fn complete(
    state: &mut BoardState,
    id: u64,
    now_ms: u64,
) -> Result<Applied, BoardError> {
    let task = state
        .human_tasks
        .get_mut(&id)
        .ok_or_else(|| BoardError::NotFound(format!("no human task {}", id)))?;

    if task.status != HumanTaskStatus::Done {
        task.status = HumanTaskStatus::Done;
        task.updated_at_ms = now_ms;
    }
    Ok(Applied::HumanTask(task.clone()))
}
