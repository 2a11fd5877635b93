// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sx_core::{DyadTask, TaskPatch, TaskPriority, TaskStatus};

fn task(title: &str) -> DyadTask {
    DyadTask { title: title.to_string(), ..DyadTask::default() }
}

#[test]
fn add_assigns_monotonic_ids_and_timestamps() {
    let mut state = BoardState::default();
    let first = applied_task(apply(&mut state, Signal::AddDyadTask(task("a")), 1_000).unwrap());
    let second = applied_task(apply(&mut state, Signal::AddDyadTask(task("b")), 2_000).unwrap());

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.created_at_ms, 1_000);
    assert_eq!(first.updated_at_ms, 1_000);
    assert_eq!(first.status, TaskStatus::Todo);
    assert_eq!(first.priority, TaskPriority::Normal);
}

#[test]
fn add_requires_title() {
    let mut state = BoardState::default();
    let result = apply(&mut state, Signal::AddDyadTask(task("  ")), 1_000);
    assert!(matches!(result, Err(BoardError::Invalid(_))));
}

#[test]
fn update_stamps_updated_at_on_status_change() {
    let mut state = BoardState::default();
    apply(&mut state, Signal::AddDyadTask(task("a")), 1_000).unwrap();

    let updated = applied_task(
        apply(
            &mut state,
            Signal::UpdateDyadTask(TaskPatch {
                id: 1,
                status: Some(TaskStatus::Blocked),
                ..TaskPatch::default()
            }),
            5_000,
        )
        .unwrap(),
    );

    assert_eq!(updated.status, TaskStatus::Blocked);
    assert_eq!(updated.updated_at_ms, 5_000);
    assert!(updated.updated_at_ms >= updated.created_at_ms);
}

#[test]
fn update_unknown_id_is_not_found() {
    let mut state = BoardState::default();
    let result = apply(
        &mut state,
        Signal::UpdateDyadTask(TaskPatch { id: 99, ..TaskPatch::default() }),
        1_000,
    );
    assert!(matches!(result, Err(BoardError::NotFound(_))));
}

#[test]
fn anchor_only_update_does_not_notify() {
    let mut state = BoardState::default();
    apply(&mut state, Signal::AddDyadTask(task("a")), 1_000).unwrap();

    let applied = apply(
        &mut state,
        Signal::UpdateDyadTask(TaskPatch {
            id: 1,
            chat_message_id: Some(77),
            ..TaskPatch::default()
        }),
        2_000,
    )
    .unwrap();

    match applied {
        Applied::DyadTask { task, notify } => {
            assert_eq!(task.chat_message_id, 77);
            assert!(!notify, "anchor writeback must not re-trigger the projector");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn substantive_update_notifies() {
    let mut state = BoardState::default();
    apply(&mut state, Signal::AddDyadTask(task("a")), 1_000).unwrap();

    let applied = apply(
        &mut state,
        Signal::UpdateDyadTask(TaskPatch {
            id: 1,
            notes: "progress".to_string(),
            chat_message_id: Some(77),
            ..TaskPatch::default()
        }),
        2_000,
    )
    .unwrap();

    assert!(matches!(applied, Applied::DyadTask { notify: true, .. }));
}

#[test]
fn open_tasks_drops_done() {
    let mut state = BoardState::default();
    apply(
        &mut state,
        Signal::AddDyadTask(DyadTask {
            dyad: "alpha".to_string(),
            kind: "beam.codex_account_reset".to_string(),
            ..task("reset")
        }),
        1_000,
    )
    .unwrap();

    assert_eq!(state.open_tasks().count(), 1);

    apply(
        &mut state,
        Signal::UpdateDyadTask(TaskPatch {
            id: 1,
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        }),
        2_000,
    )
    .unwrap();

    assert_eq!(state.open_tasks().count(), 0);
}
