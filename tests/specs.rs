// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration scenarios: board + policy + projector +
//! digest working together through the public daemon API.

use std::sync::Arc;
use std::time::Duration;

use sx_core::test_support::DyadTaskBuilder;
use sx_core::{FakeClock, Signal, TaskPatch, TaskStatus};
use sx_daemon::board::{spawn_board, Applied, BoardConfig, BoardError, BoardState};
use sx_daemon::digest;
use sx_daemon::notify::bridge::fake::RecordingBridge;
use sx_daemon::notify::{project_one, spawn_projector};
use sx_daemon::policy::PolicyConfig;

fn claim(id: u64, dyad: &str, critic: &str) -> Signal {
    Signal::ClaimDyadTask { id, dyad: dyad.to_string(), critic: critic.to_string() }
}

#[tokio::test]
async fn reclaim_succeeds_only_after_stale_lease() {
    let clock = FakeClock::new();
    let board = spawn_board(BoardState::default(), BoardConfig::default(), clock.clone());

    board
        .update(Signal::AddDyadTask(
            DyadTaskBuilder::new("task 42").dyad("dyad-x").build(),
        ))
        .await
        .unwrap();
    board.update(claim(1, "dyad-x", "c1")).await.unwrap();

    // One minute later the lease is fresh: refused.
    clock.advance(Duration::from_secs(60));
    let refused = board.update(claim(1, "dyad-x", "c2")).await;
    assert!(matches!(refused, Err(BoardError::Conflict(_))));

    // Six minutes after the original claim the lease is stale: stolen.
    clock.advance(Duration::from_secs(5 * 60));
    let applied = board.update(claim(1, "dyad-x", "c2")).await.unwrap();
    match applied {
        Applied::DyadTask { task, .. } => assert_eq!(task.claimed_by, "c2"),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn wip_cap_blocks_third_task_but_allows_updates() {
    let board = spawn_board(
        BoardState::default(),
        BoardConfig {
            policy: PolicyConfig { max_open_per_dyad: 2, ..PolicyConfig::default() },
            ..BoardConfig::default()
        },
        FakeClock::new(),
    );

    for title in ["one", "two"] {
        board
            .update(Signal::AddDyadTask(DyadTaskBuilder::new(title).dyad("alpha").build()))
            .await
            .unwrap();
    }

    let third = board
        .update(Signal::AddDyadTask(DyadTaskBuilder::new("three").dyad("alpha").build()))
        .await;
    assert!(matches!(third, Err(BoardError::Conflict(message)) if message == "dyad at capacity"));

    let update = board
        .update(Signal::UpdateDyadTask(TaskPatch {
            id: 1,
            status: Some(TaskStatus::Review),
            ..TaskPatch::default()
        }))
        .await;
    assert!(update.is_ok(), "updating an existing task passes the cap");
}

#[tokio::test]
async fn notifier_keeps_a_single_message_per_task() {
    let bridge = RecordingBridge::new();
    let board = spawn_board(BoardState::default(), BoardConfig::default(), FakeClock::new());

    board
        .update(Signal::AddDyadTask(
            DyadTaskBuilder::new("escalation").requested_by("human:ops").build(),
        ))
        .await
        .unwrap();

    // Project the same task three times, re-reading between projections.
    for _ in 0..3 {
        let task = board.dyad_tasks().await.unwrap().remove(0);
        project_one(&bridge, &board, "chat", &task).await;
    }

    let posts = bridge.posts();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].message_id, None, "first post creates");
    assert_eq!(posts[1].message_id, Some(1), "later posts edit in place");
    assert_eq!(posts[2].message_id, Some(1));

    let task = board.dyad_tasks().await.unwrap().remove(0);
    assert_eq!(task.chat_message_id, 1, "one anchor survives");
}

#[tokio::test]
async fn projector_stream_end_to_end() {
    let bridge = RecordingBridge::new();
    let (task_tx, task_rx) = tokio::sync::mpsc::channel(16);
    let board = spawn_board(
        BoardState::default(),
        BoardConfig { task_events: Some(task_tx), ..BoardConfig::default() },
        FakeClock::new(),
    );
    let _projector =
        spawn_projector(task_rx, Arc::new(bridge.clone()), board.clone(), "chat".to_string());

    board
        .update(Signal::AddDyadTask(
            DyadTaskBuilder::new("hot").requested_by("human:sam").dyad("alpha").build(),
        ))
        .await
        .unwrap();

    // Wait for the projector to post and write the anchor back.
    let mut anchored = 0;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        anchored = board.dyad_tasks().await.unwrap()[0].chat_message_id;
        if anchored != 0 {
            break;
        }
    }
    assert_eq!(anchored, 1);
    assert_eq!(bridge.posts().len(), 1);
}

#[tokio::test]
async fn digest_anchors_once_and_edits_thereafter() {
    let bridge = RecordingBridge::new();
    let board = spawn_board(BoardState::default(), BoardConfig::default(), FakeClock::new());
    for title in ["a", "b", "c"] {
        board
            .update(Signal::AddDyadTask(DyadTaskBuilder::new(title).dyad("alpha").build()))
            .await
            .unwrap();
    }

    digest::tick(&bridge, &board, "chat").await;
    digest::tick(&bridge, &board, "chat").await;

    let posts = bridge.posts();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].message_id, None);
    assert_eq!(posts[1].message_id, Some(1), "bridge edits the anchored message");
    assert_eq!(board.digest_message_id().await.unwrap(), 1, "never two anchors");
}

#[tokio::test]
async fn board_state_survives_restart_via_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("manager_state.json");

    {
        let board = spawn_board(
            BoardState::default(),
            BoardConfig { state_path: Some(state_path.clone()), ..BoardConfig::default() },
            FakeClock::new(),
        );
        board
            .update(Signal::AddDyadTask(DyadTaskBuilder::new("durable").dyad("alpha").build()))
            .await
            .unwrap();
        board.update(claim(1, "alpha", "c1")).await.unwrap();
    }

    // "Restart": load the file and spawn a fresh workflow from it.
    let recovered = sx_daemon::board::persist::load(&state_path).unwrap().unwrap();
    let board = spawn_board(recovered, BoardConfig::default(), FakeClock::new());

    let tasks = board.dyad_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].claimed_by, "c1");
    assert_eq!(tasks[0].status, TaskStatus::InProgress);

    // Ids keep climbing after recovery.
    let applied = board
        .update(Signal::AddDyadTask(DyadTaskBuilder::new("next").dyad("alpha").build()))
        .await
        .unwrap();
    match applied {
        Applied::DyadTask { task, .. } => assert_eq!(task.id, 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn done_tasks_leave_the_digest() {
    let bridge = RecordingBridge::new();
    let board = spawn_board(BoardState::default(), BoardConfig::default(), FakeClock::new());
    board
        .update(Signal::AddDyadTask(DyadTaskBuilder::new("visible").dyad("alpha").build()))
        .await
        .unwrap();
    board
        .update(Signal::AddDyadTask(DyadTaskBuilder::new("finished").dyad("alpha").build()))
        .await
        .unwrap();
    board
        .update(Signal::UpdateDyadTask(TaskPatch {
            id: 2,
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        }))
        .await
        .unwrap();

    digest::tick(&bridge, &board, "chat").await;

    let posts = bridge.posts();
    assert!(posts[0].text.contains("visible"));
    assert!(!posts[0].text.contains("finished"));
}

#[tokio::test]
async fn full_task_lifecycle_with_pool_and_policy() {
    let board = spawn_board(
        BoardState::default(),
        BoardConfig {
            policy: PolicyConfig {
                allow_pool: true,
                allow_unassigned: false,
                ..PolicyConfig::default()
            },
            ..BoardConfig::default()
        },
        FakeClock::new(),
    );

    // Unassigned refused, pool accepted.
    let unassigned =
        board.update(Signal::AddDyadTask(DyadTaskBuilder::new("floating").build())).await;
    assert!(matches!(unassigned, Err(BoardError::Conflict(_))));

    board
        .update(Signal::AddDyadTask(
            DyadTaskBuilder::new("queued").dyad("pool:night").build(),
        ))
        .await
        .unwrap();

    // A critic claims it into a concrete dyad. Pool placeholders do not
    // match the claimed dyad, so this is a conflict per the claim rules.
    let claimed = board.update(claim(1, "alpha", "c1")).await;
    assert!(matches!(claimed, Err(BoardError::Conflict(_))));

    // Reassign the pool task to the dyad first, then claim.
    board
        .update(Signal::UpdateDyadTask(TaskPatch {
            id: 1,
            dyad: "alpha".to_string(),
            ..TaskPatch::default()
        }))
        .await
        .unwrap();
    let applied = board.update(claim(1, "alpha", "c1")).await.unwrap();
    match applied {
        Applied::DyadTask { task, .. } => {
            assert_eq!(task.status, TaskStatus::InProgress);
            assert_eq!(task.dyad, "alpha");
        }
        other => panic!("unexpected {:?}", other),
    }
}
