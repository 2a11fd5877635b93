// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Board state and the signal dispatcher.
//!
//! # Idempotency requirement
//!
//! Signals are delivered at-least-once: the same payload may be applied
//! twice (HTTP retry, compat-shim signal + query). Handlers must therefore
//! converge: completing a done human task is a no-op, re-claiming by the
//! same critic refreshes the lease, merges assign rather than accumulate.

use super::{BoardError, STALE_LEASE_MS};
use crate::policy::PolicyConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use sx_core::{
    AccessRequest, Dyad, DyadTask, Feedback, Heartbeat, HumanTask, Metric, Signal,
};

/// Everything the workflow owns.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BoardState {
    #[serde(default)]
    pub dyads: BTreeMap<String, Dyad>,
    #[serde(default)]
    pub dyad_tasks: BTreeMap<u64, DyadTask>,
    #[serde(default)]
    pub next_task_id: u64,
    #[serde(default)]
    pub human_tasks: BTreeMap<u64, HumanTask>,
    #[serde(default)]
    pub next_human_task_id: u64,
    #[serde(default)]
    pub beats: VecDeque<Heartbeat>,
    #[serde(default)]
    pub next_beat_id: u64,
    #[serde(default)]
    pub feedback: Vec<Feedback>,
    #[serde(default)]
    pub next_feedback_id: u64,
    #[serde(default)]
    pub access_requests: BTreeMap<u64, AccessRequest>,
    #[serde(default)]
    pub next_access_request_id: u64,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub next_metric_id: u64,
    /// Anchor of the digest chat message; 0 when none posted yet.
    #[serde(default)]
    pub dyad_digest_message_id: i64,
}

/// What a successfully applied signal produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    None,
    /// A dyad task changed. `notify` is false when only the chat-message
    /// anchor moved, so the projector does not re-post its own writeback.
    DyadTask { task: DyadTask, notify: bool },
    HumanTask(HumanTask),
    Dyad(Dyad),
    Heartbeat(Heartbeat),
    Feedback(Feedback),
    AccessRequest(AccessRequest),
    Metric(Metric),
    DigestMessageId(i64),
}

impl BoardState {
    /// Apply a signal at `now_ms`, validating against the policy gate.
    pub fn apply(
        &mut self,
        signal: Signal,
        now_ms: u64,
        policy: &PolicyConfig,
    ) -> Result<Applied, BoardError> {
        match signal {
            Signal::Heartbeat(beat) => super::dyads::heartbeat(self, beat, now_ms),
            Signal::UpsertDyad(update) => super::dyads::upsert(self, update),
            Signal::AddHumanTask(task) => super::humans::add(self, task, now_ms),
            Signal::CompleteHumanTask { id } => super::humans::complete(self, id, now_ms),
            Signal::AddDyadTask(task) => super::tasks::add(self, task, now_ms, policy),
            Signal::UpdateDyadTask(patch) => super::tasks::update(self, patch, now_ms, policy),
            Signal::ClaimDyadTask { id, dyad, critic } => {
                super::tasks::claim(self, id, &dyad, &critic, now_ms, policy)
            }
            Signal::AddFeedback(feedback) => super::records::add_feedback(self, feedback, now_ms),
            Signal::AddAccessRequest(request) => {
                super::records::add_access_request(self, request, now_ms)
            }
            Signal::ResolveAccessRequest { id, status, by, notes } => {
                super::records::resolve_access_request(self, id, status, &by, &notes, now_ms)
            }
            Signal::AddMetric(metric) => super::records::add_metric(self, metric, now_ms),
            Signal::SetDyadDigestMessageId { id } => {
                self.dyad_digest_message_id = id;
                Ok(Applied::DigestMessageId(id))
            }
        }
    }

    /// Open (non-done) dyad tasks.
    pub fn open_tasks(&self) -> impl Iterator<Item = &DyadTask> {
        self.dyad_tasks.values().filter(|t| t.is_open())
    }

    /// Whether a claim on this task would currently be refused for the
    /// given critic (lease held by someone else and still fresh).
    pub fn lease_held_against(&self, task: &DyadTask, critic: &str, now_ms: u64) -> bool {
        !task.claimed_by.is_empty()
            && task.claimed_by != critic
            && now_ms.saturating_sub(task.heartbeat_at_ms) < STALE_LEASE_MS
    }
}
