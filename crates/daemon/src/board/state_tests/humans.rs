// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sx_core::{HumanTask, HumanTaskStatus};

fn human(title: &str, commands: &str) -> HumanTask {
    HumanTask {
        title: title.to_string(),
        commands: commands.to_string(),
        ..HumanTask::default()
    }
}

#[test]
fn add_requires_title_and_commands() {
    let mut state = BoardState::default();
    assert!(matches!(
        apply(&mut state, Signal::AddHumanTask(human("", "run this")), 1_000),
        Err(BoardError::Invalid(_))
    ));
    assert!(matches!(
        apply(&mut state, Signal::AddHumanTask(human("reset", " ")), 1_000),
        Err(BoardError::Invalid(_))
    ));
}

#[test]
fn add_assigns_id_and_open_status() {
    let mut state = BoardState::default();
    let applied = apply(
        &mut state,
        Signal::AddHumanTask(HumanTask { status: HumanTaskStatus::Done, ..human("reset", "cmd") }),
        1_000,
    )
    .unwrap();
    match applied {
        Applied::HumanTask(task) => {
            assert_eq!(task.id, 1);
            assert_eq!(task.status, HumanTaskStatus::Open, "client-set status is ignored");
            assert_eq!(task.created_at_ms, 1_000);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn complete_is_idempotent() {
    let mut state = BoardState::default();
    apply(&mut state, Signal::AddHumanTask(human("reset", "cmd")), 1_000).unwrap();

    let first = apply(&mut state, Signal::CompleteHumanTask { id: 1 }, 2_000).unwrap();
    let second = apply(&mut state, Signal::CompleteHumanTask { id: 1 }, 3_000).unwrap();

    match (first, second) {
        (Applied::HumanTask(a), Applied::HumanTask(b)) => {
            assert_eq!(a.status, HumanTaskStatus::Done);
            assert_eq!(b.status, HumanTaskStatus::Done);
            assert_eq!(b.updated_at_ms, 2_000, "second complete does not restamp");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn complete_unknown_is_not_found() {
    let mut state = BoardState::default();
    assert!(matches!(
        apply(&mut state, Signal::CompleteHumanTask { id: 5 }, 1_000),
        Err(BoardError::NotFound(_))
    ));
}
