// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal vocabulary for the board workflow.
//!
//! Every mutation of board state enters through exactly one of these
//! signals. Serializes with `{"type": "signal:name", ...fields}` format so
//! payloads are self-describing in the persisted state file and logs.

use crate::dyad::DyadUpdate;
use crate::records::{AccessRequest, AccessStatus, Feedback, Heartbeat, Metric};
use crate::task::{DyadTask, HumanTask, TaskPatch};
use serde::{Deserialize, Serialize};

/// Signals that mutate board state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Signal {
    #[serde(rename = "heartbeat")]
    Heartbeat(Heartbeat),

    #[serde(rename = "upsert_dyad")]
    UpsertDyad(DyadUpdate),

    #[serde(rename = "add_human_task")]
    AddHumanTask(HumanTask),

    #[serde(rename = "complete_human_task")]
    CompleteHumanTask { id: u64 },

    #[serde(rename = "add_dyad_task")]
    AddDyadTask(DyadTask),

    #[serde(rename = "update_dyad_task")]
    UpdateDyadTask(TaskPatch),

    #[serde(rename = "claim_dyad_task")]
    ClaimDyadTask { id: u64, dyad: String, critic: String },

    #[serde(rename = "add_feedback")]
    AddFeedback(Feedback),

    #[serde(rename = "add_access_request")]
    AddAccessRequest(AccessRequest),

    #[serde(rename = "resolve_access_request")]
    ResolveAccessRequest { id: u64, status: AccessStatus, by: String, notes: String },

    #[serde(rename = "add_metric")]
    AddMetric(Metric),

    #[serde(rename = "set_dyad_digest_message_id")]
    SetDyadDigestMessageId { id: i64 },
}

impl Signal {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Heartbeat(_) => "heartbeat",
            Signal::UpsertDyad(_) => "upsert_dyad",
            Signal::AddHumanTask(_) => "add_human_task",
            Signal::CompleteHumanTask { .. } => "complete_human_task",
            Signal::AddDyadTask(_) => "add_dyad_task",
            Signal::UpdateDyadTask(_) => "update_dyad_task",
            Signal::ClaimDyadTask { .. } => "claim_dyad_task",
            Signal::AddFeedback(_) => "add_feedback",
            Signal::AddAccessRequest(_) => "add_access_request",
            Signal::ResolveAccessRequest { .. } => "resolve_access_request",
            Signal::AddMetric(_) => "add_metric",
            Signal::SetDyadDigestMessageId { .. } => "set_dyad_digest_message_id",
        }
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
