// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP listener: a stateless adapter from routes to board signals and
//! queries.
//!
//! The listener owns nothing mutable. Validation and policy run inside the
//! board workflow; this layer only maps [`BoardError`] onto status codes:
//! Invalid → 400, NotFound → 404, Conflict → 409, everything upstream →
//! 502.

mod routes;

use crate::board::{BoardError, BoardHandle};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;

/// Shared context for all request handlers.
pub struct ListenCtx {
    pub board: BoardHandle,
    pub start_time: Instant,
}

/// Error envelope mapped onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<BoardError> for ApiError {
    fn from(e: BoardError) -> Self {
        let status = match &e {
            BoardError::Invalid(_) => StatusCode::BAD_REQUEST,
            BoardError::NotFound(_) => StatusCode::NOT_FOUND,
            BoardError::Conflict(_) => StatusCode::CONFLICT,
            BoardError::UnknownUpdate(_) | BoardError::Closed => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::BAD_GATEWAY {
            tracing::error!(error = %e, "board upstream failure");
        }
        Self { status, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Build the board HTTP router.
pub fn router(ctx: Arc<ListenCtx>) -> Router {
    Router::new()
        .route("/heartbeat", post(routes::post_heartbeat))
        .route("/beats", get(routes::get_beats))
        .route("/dyads", get(routes::get_dyads).post(routes::post_dyad))
        .route(
            "/human-tasks",
            get(routes::get_human_tasks).post(routes::post_human_task),
        )
        .route("/human-tasks/complete", post(routes::post_human_task_complete))
        .route("/feedback", get(routes::get_feedback).post(routes::post_feedback))
        .route(
            "/access-requests",
            get(routes::get_access_requests).post(routes::post_access_request),
        )
        .route("/access-requests/resolve", post(routes::post_access_request_resolve))
        .route("/metrics", get(routes::get_metrics).post(routes::post_metric))
        .route("/healthz", get(routes::get_healthz))
        .route("/dyad-tasks", get(routes::get_dyad_tasks).post(routes::post_dyad_task))
        .route("/dyad-tasks/update", post(routes::post_dyad_task_update))
        .route("/dyad-tasks/claim", post(routes::post_dyad_task_claim))
        .with_state(ctx)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
