// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    low    = { "\"low\"", TaskPriority::Low },
    p2     = { "\"p2\"", TaskPriority::Low },
    normal = { "\"normal\"", TaskPriority::Normal },
    p1     = { "\"p1\"", TaskPriority::Normal },
    medium = { "\"medium\"", TaskPriority::Normal },
    high   = { "\"high\"", TaskPriority::High },
    p0     = { "\"p0\"", TaskPriority::High },
    urgent = { "\"urgent\"", TaskPriority::High },
)]
fn priority_aliases(json: &str, expected: TaskPriority) {
    let priority: TaskPriority = serde_json::from_str(json).unwrap();
    assert_eq!(priority, expected);
}

#[test]
fn priority_orders_low_to_high() {
    assert!(TaskPriority::Low < TaskPriority::Normal);
    assert!(TaskPriority::Normal < TaskPriority::High);
}

#[yare::parameterized(
    blocked     = { TaskStatus::Blocked, 0 },
    review      = { TaskStatus::Review, 1 },
    in_progress = { TaskStatus::InProgress, 2 },
    todo        = { TaskStatus::Todo, 3 },
    done        = { TaskStatus::Done, 9 },
)]
fn digest_rank(status: TaskStatus, rank: u8) {
    assert_eq!(status.digest_rank(), rank);
}

#[test]
fn status_accepts_hyphenated_in_progress() {
    let status: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
    assert_eq!(status, TaskStatus::InProgress);
}

#[yare::parameterized(
    pool    = { "pool:night", true },
    concrete = { "alpha", false },
    empty   = { "", false },
)]
fn pool_detection(dyad: &str, expected: bool) {
    assert_eq!(is_pool_dyad(dyad), expected);
}

#[test]
fn patch_applies_non_empty_fields_only() {
    let mut task = DyadTask {
        id: 7,
        title: "fix login".to_string(),
        notes: "original".to_string(),
        ..DyadTask::default()
    };

    let changed = TaskPatch {
        id: 7,
        notes: "updated".to_string(),
        status: Some(TaskStatus::Review),
        ..TaskPatch::default()
    }
    .apply_to(&mut task);

    assert!(changed);
    assert_eq!(task.title, "fix login", "empty patch title leaves field alone");
    assert_eq!(task.notes, "updated");
    assert_eq!(task.status, TaskStatus::Review);
}

#[test]
fn patch_reports_no_change_for_identical_fields() {
    let mut task = DyadTask { id: 7, title: "t".to_string(), ..DyadTask::default() };
    let changed = TaskPatch { id: 7, title: "t".to_string(), ..TaskPatch::default() }
        .apply_to(&mut task);
    assert!(!changed);
}

#[test]
fn patch_sets_chat_message_id() {
    let mut task = DyadTask { id: 7, title: "t".to_string(), ..DyadTask::default() };
    TaskPatch { id: 7, chat_message_id: Some(991), ..TaskPatch::default() }.apply_to(&mut task);
    assert_eq!(task.chat_message_id, 991);
}
