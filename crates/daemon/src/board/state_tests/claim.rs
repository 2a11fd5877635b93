// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sx_core::{DyadTask, TaskPatch, TaskStatus};

const MIN: u64 = 60_000;

fn claim(id: u64, dyad: &str, critic: &str) -> Signal {
    Signal::ClaimDyadTask { id, dyad: dyad.to_string(), critic: critic.to_string() }
}

fn seeded(dyad: &str) -> BoardState {
    let mut state = BoardState::default();
    apply(
        &mut state,
        Signal::AddDyadTask(DyadTask {
            title: "task".to_string(),
            dyad: dyad.to_string(),
            ..DyadTask::default()
        }),
        1_000,
    )
    .unwrap();
    state
}

#[test]
fn claim_promotes_todo_and_records_lease() {
    let mut state = seeded("alpha");
    let task = applied_task(apply(&mut state, claim(1, "alpha", "c1"), 10_000).unwrap());

    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.claimed_by, "c1");
    assert_eq!(task.claimed_at_ms, 10_000);
    assert_eq!(task.heartbeat_at_ms, 10_000);
    assert_eq!(task.updated_at_ms, 10_000);
}

#[test]
fn claim_sets_dyad_when_empty() {
    let mut state = seeded("");
    let task = applied_task(apply(&mut state, claim(1, "alpha", "c1"), 10_000).unwrap());
    assert_eq!(task.dyad, "alpha");
}

#[test]
fn claim_refuses_other_dyads_task() {
    let mut state = seeded("alpha");
    let result = apply(&mut state, claim(1, "beta", "c1"), 10_000);
    assert_eq!(result, Err(BoardError::Conflict("task belongs to another dyad".to_string())));
}

#[test]
fn claim_refuses_done_task() {
    let mut state = seeded("alpha");
    apply(
        &mut state,
        Signal::UpdateDyadTask(TaskPatch {
            id: 1,
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        }),
        5_000,
    )
    .unwrap();
    let result = apply(&mut state, claim(1, "alpha", "c1"), 10_000);
    assert_eq!(result, Err(BoardError::Conflict("task is done".to_string())));
}

#[test]
fn fresh_lease_refuses_other_critic() {
    let mut state = seeded("alpha");
    let t0 = 10_000;
    apply(&mut state, claim(1, "alpha", "c1"), t0).unwrap();

    // One minute later the lease is fresh: c2 is refused.
    let result = apply(&mut state, claim(1, "alpha", "c2"), t0 + MIN);
    assert_eq!(result, Err(BoardError::Conflict("task claimed by another critic".to_string())));
}

#[test]
fn stale_lease_is_stolen() {
    let mut state = seeded("alpha");
    let t0 = 10_000;
    apply(&mut state, claim(1, "alpha", "c1"), t0).unwrap();

    // Six minutes later the lease is stale: c2 takes over.
    let task = applied_task(apply(&mut state, claim(1, "alpha", "c2"), t0 + 6 * MIN).unwrap());
    assert_eq!(task.claimed_by, "c2");
    assert_eq!(task.claimed_at_ms, t0 + 6 * MIN);
}

#[test]
fn reclaim_by_owner_refreshes_heartbeat_not_claimed_at() {
    let mut state = seeded("alpha");
    let t0 = 10_000;
    apply(&mut state, claim(1, "alpha", "c1"), t0).unwrap();

    let task = applied_task(apply(&mut state, claim(1, "alpha", "c1"), t0 + MIN).unwrap());
    assert_eq!(task.claimed_at_ms, t0, "same owner keeps the original claim time");
    assert_eq!(task.heartbeat_at_ms, t0 + MIN);
}

#[test]
fn claim_requires_critic() {
    let mut state = seeded("alpha");
    let result = apply(&mut state, claim(1, "alpha", ""), 10_000);
    assert!(matches!(result, Err(BoardError::Invalid(_))));
}

#[test]
fn claim_unknown_task_is_not_found() {
    let mut state = BoardState::default();
    let result = apply(&mut state, claim(7, "alpha", "c1"), 10_000);
    assert!(matches!(result, Err(BoardError::NotFound(_))));
}

#[test]
fn claim_does_not_demote_review() {
    let mut state = seeded("alpha");
    apply(
        &mut state,
        Signal::UpdateDyadTask(TaskPatch {
            id: 1,
            status: Some(TaskStatus::Review),
            ..TaskPatch::default()
        }),
        5_000,
    )
    .unwrap();

    let task = applied_task(apply(&mut state, claim(1, "alpha", "c1"), 10_000).unwrap());
    assert_eq!(task.status, TaskStatus::Review, "only todo promotes to in_progress");
}
