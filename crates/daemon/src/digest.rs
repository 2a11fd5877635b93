// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Digest ticker: a single anchored chat message ranking the open board.
//!
//! Every tick rebuilds the message from scratch and edits the anchor in
//! place, so a missed tick costs nothing and a crashed tick is retried by
//! the next one.

use crate::board::BoardHandle;
use crate::notify::{html_escape, priority_emoji, status_emoji, BridgePost, ChatBridge};
use std::sync::Arc;
use std::time::Duration;
use sx_core::{DyadTask, Signal};
use tokio_util::sync::CancellationToken;

/// How many tasks one digest shows before the overflow ellipsis.
pub const DIGEST_LIMIT: usize = 20;

/// Rank open tasks for the digest: priority descending, then status
/// (blocked, review, in_progress, todo), then dyad, then id.
pub fn rank_open_tasks(tasks: &[DyadTask]) -> Vec<DyadTask> {
    let mut open: Vec<DyadTask> = tasks.iter().filter(|t| t.is_open()).cloned().collect();
    open.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.status.digest_rank().cmp(&b.status.digest_rank()))
            .then(a.dyad.cmp(&b.dyad))
            .then(a.id.cmp(&b.id))
    });
    open
}

/// Render the ranked board as one HTML message.
pub fn render_digest(tasks: &[DyadTask]) -> String {
    let ranked = rank_open_tasks(tasks);
    let mut lines = vec![format!("<b>Dyad task board</b> ({} open)", ranked.len())];
    for task in ranked.iter().take(DIGEST_LIMIT) {
        let dyad = if task.dyad.is_empty() { "—".to_string() } else { task.dyad.clone() };
        lines.push(format!(
            "{} {} <b>#{}</b> {} [{}]",
            priority_emoji(task.priority),
            status_emoji(task.status),
            task.id,
            html_escape(&task.title),
            html_escape(&dyad),
        ));
    }
    if ranked.len() > DIGEST_LIMIT {
        lines.push(format!("… {} more", ranked.len() - DIGEST_LIMIT));
    }
    lines.join("\n")
}

/// Rebuild the digest once and upsert it against the stored anchor.
pub async fn tick(bridge: &dyn ChatBridge, board: &BoardHandle, chat_id: &str) {
    let tasks = match board.dyad_tasks().await {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!(error = %e, "digest: task query failed");
            return;
        }
    };
    let anchor = match board.digest_message_id().await {
        Ok(id) if id != 0 => Some(id),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "digest: anchor query failed");
            return;
        }
    };

    let post = BridgePost::new(chat_id, render_digest(&tasks), anchor);
    match bridge.post(&post).await {
        Ok(reply) => {
            if Some(reply.message_id) != anchor {
                let signal = Signal::SetDyadDigestMessageId { id: reply.message_id };
                if let Err(e) = board.signal(signal).await {
                    tracing::warn!(error = %e, "digest: anchor store failed");
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "digest: bridge post failed"),
    }
}

/// Spawn the ticker loop.
pub fn spawn_ticker(
    bridge: Arc<dyn ChatBridge>,
    board: BoardHandle,
    chat_id: String,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => tick(&*bridge, &board, &chat_id).await,
            }
        }
    })
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
