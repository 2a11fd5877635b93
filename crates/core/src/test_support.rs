// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates.

use crate::task::{DyadTask, TaskPriority, TaskStatus};

/// Builder for dyad tasks in tests.
pub struct DyadTaskBuilder {
    task: DyadTask,
}

impl DyadTaskBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self { task: DyadTask { title: title.into(), ..DyadTask::default() } }
    }

    pub fn id(mut self, id: u64) -> Self {
        self.task.id = id;
        self
    }

    pub fn dyad(mut self, dyad: impl Into<String>) -> Self {
        self.task.dyad = dyad.into();
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.task.kind = kind.into();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn requested_by(mut self, requested_by: impl Into<String>) -> Self {
        self.task.requested_by = requested_by.into();
        self
    }

    pub fn claimed_by(mut self, critic: impl Into<String>, heartbeat_at_ms: u64) -> Self {
        self.task.claimed_by = critic.into();
        self.task.heartbeat_at_ms = heartbeat_at_ms;
        self
    }

    pub fn build(self) -> DyadTask {
        self.task
    }
}
