// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dyad tasks and human tasks.
//!
//! Dyad tasks are the shared board worked by critic agents; human tasks are
//! runbook items a person executes. Both get server-assigned ids and
//! timestamps when they enter the board.

use serde::{Deserialize, Serialize};

/// Status of a dyad task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    #[serde(alias = "in-progress")]
    InProgress,
    Review,
    Blocked,
    Done,
}

impl TaskStatus {
    /// Digest sort rank: blocked first, then review, in-progress, todo.
    pub fn digest_rank(self) -> u8 {
        match self {
            TaskStatus::Blocked => 0,
            TaskStatus::Review => 1,
            TaskStatus::InProgress => 2,
            TaskStatus::Todo => 3,
            TaskStatus::Done => 9,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

crate::simple_display! {
    TaskStatus {
        Todo => "todo",
        InProgress => "in_progress",
        Review => "review",
        Blocked => "blocked",
        Done => "done",
    }
}

/// Priority of a dyad task. Aliases from older clients are folded in at
/// deserialization time: p0/urgent are high, p1/medium are normal, p2 is low.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    #[serde(alias = "p2")]
    Low,
    #[default]
    #[serde(alias = "p1", alias = "medium")]
    Normal,
    #[serde(alias = "p0", alias = "urgent")]
    High,
}

crate::simple_display! {
    TaskPriority {
        Low => "low",
        Normal => "normal",
        High => "high",
    }
}

/// True when the dyad field is a pool placeholder (`pool:<name>`).
pub fn is_pool_dyad(dyad: &str) -> bool {
    dyad.starts_with("pool:")
}

/// A task on the dyad board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DyadTask {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Dyad slug, empty for unassigned, or `pool:<name>`.
    #[serde(default)]
    pub dyad: String,
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub critic: String,
    #[serde(default)]
    pub requested_by: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub claimed_by: String,
    #[serde(default)]
    pub claimed_at_ms: u64,
    #[serde(default)]
    pub heartbeat_at_ms: u64,
    /// Anchor of the single chat message tracking this task.
    #[serde(default)]
    pub chat_message_id: i64,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl DyadTask {
    pub fn is_open(&self) -> bool {
        !self.status.is_done()
    }
}

/// Partial update for a dyad task. Empty strings and absent options leave
/// the field unchanged, matching the merge semantics of `upsert_dyad`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub dyad: String,
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub critic: String,
    #[serde(default)]
    pub requested_by: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_message_id: Option<i64>,
}

impl TaskPatch {
    /// Apply the non-empty fields to a task. Returns true if anything
    /// changed. The caller stamps `updated_at_ms`.
    pub fn apply_to(&self, task: &mut DyadTask) -> bool {
        let mut changed = false;
        let mut take = |dst: &mut String, src: &str| {
            if !src.is_empty() && dst != src {
                *dst = src.to_string();
                changed = true;
            }
        };
        take(&mut task.title, &self.title);
        take(&mut task.description, &self.description);
        take(&mut task.kind, &self.kind);
        take(&mut task.dyad, &self.dyad);
        take(&mut task.actor, &self.actor);
        take(&mut task.critic, &self.critic);
        take(&mut task.requested_by, &self.requested_by);
        take(&mut task.notes, &self.notes);
        take(&mut task.link, &self.link);
        if let Some(status) = self.status {
            if task.status != status {
                task.status = status;
                changed = true;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                task.priority = priority;
                changed = true;
            }
        }
        if let Some(chat_id) = self.chat_message_id {
            if task.chat_message_id != chat_id {
                task.chat_message_id = chat_id;
                changed = true;
            }
        }
        changed
    }
}

/// Status of a human task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HumanTaskStatus {
    #[default]
    Open,
    Done,
}

crate::simple_display! {
    HumanTaskStatus {
        Open => "open",
        Done => "done",
    }
}

/// A runbook item for a person: a title and the commands to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanTask {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// The commands to execute. Required at creation.
    #[serde(default)]
    pub commands: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub requested_by: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub status: HumanTaskStatus,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
