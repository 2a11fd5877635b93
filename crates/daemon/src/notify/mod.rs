// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifier projector: one chat message per dyad task.
//!
//! Task updates that pass the "should notify" filter are upserted against
//! the bridge. The first post creates a message; its id is written back to
//! the task via a follow-up signal so every later update edits in place.
//! The projector is idempotent on the message id, which makes the
//! three-signal sequence (update, notify, persist id) safe under
//! at-least-once delivery.

pub mod bridge;

pub use bridge::{BridgeError, BridgePost, BridgeReply, ChatBridge, HttpBridge};

use crate::board::BoardHandle;
use std::sync::Arc;
use sx_core::{DyadTask, Signal, TaskPatch, TaskPriority, TaskStatus};
use tokio::sync::mpsc;

/// Should this task update reach the chat?
pub fn is_notifiable(task: &DyadTask) -> bool {
    task.requested_by.starts_with("human")
        || task.kind.starts_with("beam.")
        || matches!(task.status, TaskStatus::Blocked | TaskStatus::Review | TaskStatus::Done)
        || task.priority == TaskPriority::High
}

/// Escape user text for HTML message bodies.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn status_emoji(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "📋",
        TaskStatus::InProgress => "🔧",
        TaskStatus::Review => "👀",
        TaskStatus::Blocked => "⛔",
        TaskStatus::Done => "✅",
    }
}

pub fn priority_emoji(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "🔽",
        TaskPriority::Normal => "▪️",
        TaskPriority::High => "🔺",
    }
}

fn kind_emoji(kind: &str) -> &'static str {
    if kind.starts_with("beam.") {
        "🧭"
    } else {
        "🛠"
    }
}

/// Render one task as a compact HTML message.
pub fn render_task(task: &DyadTask) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} <b>#{} {}</b>",
        status_emoji(task.status),
        task.id,
        html_escape(&task.title)
    ));
    let mut meta =
        format!("{} {} · {}", priority_emoji(task.priority), task.priority, task.status);
    if !task.kind.is_empty() {
        meta.push_str(&format!(" · {} {}", kind_emoji(&task.kind), html_escape(&task.kind)));
    }
    lines.push(meta);
    if !task.dyad.is_empty() || !task.claimed_by.is_empty() {
        let mut who = Vec::new();
        if !task.dyad.is_empty() {
            who.push(format!("dyad: {}", html_escape(&task.dyad)));
        }
        if !task.claimed_by.is_empty() {
            who.push(format!("critic: {}", html_escape(&task.claimed_by)));
        }
        lines.push(who.join(" · "));
    }
    if !task.requested_by.is_empty() {
        lines.push(format!("from: {}", html_escape(&task.requested_by)));
    }
    if !task.notes.is_empty() {
        lines.push(html_escape(&task.notes));
    }
    if !task.link.is_empty() {
        lines.push(html_escape(&task.link));
    }
    lines.join("\n")
}

/// Spawn the projector over the board's task-event stream.
pub fn spawn_projector(
    mut events: mpsc::Receiver<DyadTask>,
    bridge: Arc<dyn ChatBridge>,
    board: BoardHandle,
    chat_id: String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(task) = events.recv().await {
            if !is_notifiable(&task) {
                continue;
            }
            project_one(&*bridge, &board, &chat_id, &task).await;
        }
    })
}

/// Upsert one task's chat message and persist the anchor if it moved.
pub async fn project_one(
    bridge: &dyn ChatBridge,
    board: &BoardHandle,
    chat_id: &str,
    task: &DyadTask,
) {
    let prior = (task.chat_message_id != 0).then_some(task.chat_message_id);
    let post = BridgePost::new(chat_id, render_task(task), prior);
    match bridge.post(&post).await {
        Ok(reply) => {
            if Some(reply.message_id) != prior {
                let writeback = Signal::UpdateDyadTask(TaskPatch {
                    id: task.id,
                    chat_message_id: Some(reply.message_id),
                    ..TaskPatch::default()
                });
                if let Err(e) = board.signal(writeback).await {
                    tracing::warn!(task = task.id, error = %e, "anchor writeback failed");
                }
            }
        }
        Err(e) => {
            tracing::warn!(task = task.id, error = %e, "chat bridge post failed");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
