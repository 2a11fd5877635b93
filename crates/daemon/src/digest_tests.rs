// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::board::{spawn_board, BoardConfig, BoardState};
use crate::notify::bridge::fake::RecordingBridge;
use sx_core::test_support::DyadTaskBuilder;
use sx_core::{FakeClock, TaskPriority, TaskStatus};

#[test]
fn ranking_orders_priority_then_status_then_dyad_then_id() {
    let tasks = vec![
        DyadTaskBuilder::new("low-ip")
            .id(1)
            .priority(TaskPriority::Low)
            .status(TaskStatus::InProgress)
            .build(),
        DyadTaskBuilder::new("high-blocked")
            .id(2)
            .priority(TaskPriority::High)
            .status(TaskStatus::Blocked)
            .build(),
        DyadTaskBuilder::new("normal-blocked")
            .id(3)
            .priority(TaskPriority::Normal)
            .status(TaskStatus::Blocked)
            .build(),
    ];

    let ranked = rank_open_tasks(&tasks);
    let titles: Vec<&str> = ranked.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["high-blocked", "normal-blocked", "low-ip"]);
}

#[test]
fn ranking_breaks_ties_by_dyad_then_id() {
    let tasks = vec![
        DyadTaskBuilder::new("b2").id(9).dyad("beta").build(),
        DyadTaskBuilder::new("a1").id(5).dyad("alpha").build(),
        DyadTaskBuilder::new("a0").id(3).dyad("alpha").build(),
    ];
    let ranked = rank_open_tasks(&tasks);
    let ids: Vec<u64> = ranked.iter().map(|t| t.id).collect();
    assert_eq!(ids, [3, 5, 9]);
}

#[test]
fn ranking_drops_done() {
    let tasks = vec![
        DyadTaskBuilder::new("done").id(1).status(TaskStatus::Done).build(),
        DyadTaskBuilder::new("open").id(2).build(),
    ];
    let ranked = rank_open_tasks(&tasks);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].id, 2);
}

#[test]
fn digest_truncates_with_ellipsis() {
    let tasks: Vec<_> =
        (1..=25).map(|i| DyadTaskBuilder::new(format!("t{i}")).id(i).build()).collect();
    let html = render_digest(&tasks);
    assert!(html.contains("… 5 more"));
    assert!(html.contains("(25 open)"));
}

#[tokio::test]
async fn tick_anchors_first_message_then_edits() {
    let bridge = RecordingBridge::new();
    let board = spawn_board(BoardState::default(), BoardConfig::default(), FakeClock::new());
    for title in ["a", "b", "c"] {
        board
            .update(sx_core::Signal::AddDyadTask(DyadTaskBuilder::new(title).build()))
            .await
            .unwrap();
    }

    // First tick: no anchor yet, creates and stores one.
    tick(&bridge, &board, "chat-1").await;
    assert_eq!(board.digest_message_id().await.unwrap(), 1);

    // Second tick: edits the same message; the anchor does not change.
    tick(&bridge, &board, "chat-1").await;
    assert_eq!(board.digest_message_id().await.unwrap(), 1);

    let posts = bridge.posts();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].message_id, None);
    assert_eq!(posts[1].message_id, Some(1));
}
