// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::state::{Applied, BoardState};
use super::BoardError;
use crate::policy::PolicyConfig;
use sx_core::Signal;

mod claim;
mod humans;
mod records;
mod tasks;

/// Apply with the permissive default policy at the given time.
fn apply(state: &mut BoardState, signal: Signal, now_ms: u64) -> Result<Applied, BoardError> {
    state.apply(signal, now_ms, &PolicyConfig::default())
}

/// Unwrap an applied dyad task.
fn applied_task(applied: Applied) -> sx_core::DyadTask {
    match applied {
        Applied::DyadTask { task, .. } => task,
        other => panic!("expected dyad task, got {:?}", other),
    }
}
