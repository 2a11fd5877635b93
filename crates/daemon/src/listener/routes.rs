// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route handlers. Each one is a thin translation: payload → signal,
//! query → snapshot, board error → status code.

use super::{ApiError, ListenCtx};
use crate::board::{Applied, Query, QueryReply};
use axum::extract::{Query as UrlQuery, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use sx_core::{
    AccessRequest, AccessStatus, DyadTask, DyadUpdate, Feedback, Heartbeat, HumanTask, Metric,
    Signal, TaskPatch,
};

type Ctx = State<Arc<ListenCtx>>;

pub(super) async fn post_heartbeat(
    State(ctx): Ctx,
    Json(beat): Json<Heartbeat>,
) -> Result<StatusCode, ApiError> {
    ctx.board.update(Signal::Heartbeat(beat)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn get_beats(State(ctx): Ctx) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.query(Query::Beats).await? {
        QueryReply::Beats(beats) => Ok(Json(serde_json::json!(beats))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn get_dyads(State(ctx): Ctx) -> Result<Json<serde_json::Value>, ApiError> {
    let dyads = ctx.board.dyads().await?;
    Ok(Json(serde_json::json!(dyads)))
}

pub(super) async fn post_dyad(
    State(ctx): Ctx,
    Json(update): Json<DyadUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.update(Signal::UpsertDyad(update)).await? {
        Applied::Dyad(dyad) => Ok(Json(serde_json::json!(dyad))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn get_human_tasks(
    State(ctx): Ctx,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tasks = ctx.board.human_tasks().await?;
    Ok(Json(serde_json::json!(tasks)))
}

pub(super) async fn post_human_task(
    State(ctx): Ctx,
    Json(task): Json<HumanTask>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.update(Signal::AddHumanTask(task)).await? {
        Applied::HumanTask(task) => Ok(Json(serde_json::json!(task))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

#[derive(Deserialize)]
pub(super) struct IdParam {
    pub(super) id: Option<u64>,
}

pub(super) async fn post_human_task_complete(
    State(ctx): Ctx,
    UrlQuery(params): UrlQuery<IdParam>,
) -> Result<StatusCode, ApiError> {
    let id = params.id.ok_or_else(|| ApiError::bad_request("id required"))?;
    ctx.board.update(Signal::CompleteHumanTask { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn get_feedback(State(ctx): Ctx) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.query(Query::Feedback).await? {
        QueryReply::Feedback(feedback) => Ok(Json(serde_json::json!(feedback))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn post_feedback(
    State(ctx): Ctx,
    Json(feedback): Json<Feedback>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.update(Signal::AddFeedback(feedback)).await? {
        Applied::Feedback(feedback) => Ok(Json(serde_json::json!(feedback))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn get_access_requests(
    State(ctx): Ctx,
) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.query(Query::AccessRequests).await? {
        QueryReply::AccessRequests(requests) => Ok(Json(serde_json::json!(requests))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn post_access_request(
    State(ctx): Ctx,
    Json(request): Json<AccessRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.update(Signal::AddAccessRequest(request)).await? {
        Applied::AccessRequest(request) => Ok(Json(serde_json::json!(request))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

#[derive(Deserialize)]
pub(super) struct ResolveParams {
    pub(super) id: Option<u64>,
    pub(super) status: Option<String>,
    #[serde(default)]
    pub(super) by: String,
    #[serde(default)]
    pub(super) notes: String,
}

pub(super) async fn post_access_request_resolve(
    State(ctx): Ctx,
    UrlQuery(params): UrlQuery<ResolveParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = params.id.ok_or_else(|| ApiError::bad_request("id required"))?;
    let status = params
        .status
        .as_deref()
        .and_then(AccessStatus::parse_resolution)
        .ok_or_else(|| ApiError::bad_request("status must be approved or denied"))?;

    let signal = Signal::ResolveAccessRequest {
        id,
        status,
        by: params.by,
        notes: params.notes,
    };
    match ctx.board.update(signal).await? {
        Applied::AccessRequest(request) => Ok(Json(serde_json::json!(request))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn get_metrics(State(ctx): Ctx) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.query(Query::Metrics).await? {
        QueryReply::Metrics(metrics) => Ok(Json(serde_json::json!(metrics))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn post_metric(
    State(ctx): Ctx,
    Json(metric): Json<Metric>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.update(Signal::AddMetric(metric)).await? {
        Applied::Metric(metric) => Ok(Json(serde_json::json!(metric))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn get_healthz(State(ctx): Ctx) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.query(Query::Healthz).await? {
        QueryReply::Healthz(info) => {
            let mut doc = serde_json::json!(info);
            doc["uptime_seconds"] =
                serde_json::json!(ctx.start_time.elapsed().as_secs());
            Ok(Json(doc))
        }
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn get_dyad_tasks(
    State(ctx): Ctx,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tasks = ctx.board.dyad_tasks().await?;
    Ok(Json(serde_json::json!(tasks)))
}

pub(super) async fn post_dyad_task(
    State(ctx): Ctx,
    Json(task): Json<DyadTask>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match ctx.board.update(Signal::AddDyadTask(task)).await? {
        Applied::DyadTask { task, .. } => Ok(Json(serde_json::json!(task))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

pub(super) async fn post_dyad_task_update(
    State(ctx): Ctx,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if patch.id == 0 {
        return Err(ApiError::bad_request("id required"));
    }
    match ctx.board.update(Signal::UpdateDyadTask(patch)).await? {
        Applied::DyadTask { task, .. } => Ok(Json(serde_json::json!(task))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}

#[derive(Deserialize)]
pub(super) struct ClaimBody {
    pub(super) id: Option<u64>,
    #[serde(default)]
    pub(super) dyad: String,
    #[serde(default)]
    pub(super) critic: String,
}

pub(super) async fn post_dyad_task_claim(
    State(ctx): Ctx,
    Json(body): Json<ClaimBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = body.id.ok_or_else(|| ApiError::bad_request("id required"))?;
    if body.critic.is_empty() {
        return Err(ApiError::bad_request("critic required"));
    }
    let signal = Signal::ClaimDyadTask { id, dyad: body.dyad, critic: body.critic };
    match ctx.board.update(signal).await? {
        Applied::DyadTask { task, .. } => Ok(Json(serde_json::json!(task))),
        _ => Err(ApiError::bad_request("unexpected reply")),
    }
}
