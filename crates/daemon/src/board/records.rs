// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only record handlers: feedback, access requests, metrics.

use super::state::{Applied, BoardState};
use super::BoardError;
use sx_core::{AccessRequest, AccessStatus, Feedback, Metric};

pub(super) fn add_feedback(
    state: &mut BoardState,
    mut feedback: Feedback,
    now_ms: u64,
) -> Result<Applied, BoardError> {
    if feedback.message.trim().is_empty() {
        return Err(BoardError::Invalid("message required".to_string()));
    }
    state.next_feedback_id += 1;
    feedback.id = state.next_feedback_id;
    feedback.at_ms = now_ms;
    state.feedback.push(feedback.clone());
    Ok(Applied::Feedback(feedback))
}

pub(super) fn add_access_request(
    state: &mut BoardState,
    mut request: AccessRequest,
    now_ms: u64,
) -> Result<Applied, BoardError> {
    if request.requester.trim().is_empty()
        || request.resource.trim().is_empty()
        || request.action.trim().is_empty()
    {
        return Err(BoardError::Invalid("requester, resource and action required".to_string()));
    }
    state.next_access_request_id += 1;
    request.id = state.next_access_request_id;
    request.status = AccessStatus::Pending;
    request.at_ms = now_ms;
    request.resolved_at_ms = 0;
    state.access_requests.insert(request.id, request.clone());
    Ok(Applied::AccessRequest(request))
}

pub(super) fn resolve_access_request(
    state: &mut BoardState,
    id: u64,
    status: AccessStatus,
    by: &str,
    notes: &str,
    now_ms: u64,
) -> Result<Applied, BoardError> {
    if status == AccessStatus::Pending {
        return Err(BoardError::Invalid("resolution must be approved or denied".to_string()));
    }
    let request = state
        .access_requests
        .get_mut(&id)
        .ok_or_else(|| BoardError::NotFound(format!("no access request {}", id)))?;
    request.status = status;
    request.resolved_by = by.to_string();
    request.notes = notes.to_string();
    request.resolved_at_ms = now_ms;
    Ok(Applied::AccessRequest(request.clone()))
}

pub(super) fn add_metric(
    state: &mut BoardState,
    mut metric: Metric,
    now_ms: u64,
) -> Result<Applied, BoardError> {
    if metric.name.trim().is_empty() {
        return Err(BoardError::Invalid("name required".to_string()));
    }
    state.next_metric_id += 1;
    metric.id = state.next_metric_id;
    metric.at_ms = now_ms;
    state.metrics.push(metric.clone());
    Ok(Applied::Metric(metric))
}
