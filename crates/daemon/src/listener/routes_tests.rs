// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler-level tests: each handler is an async fn, called directly with
//! a board backed by a fake clock.

use super::routes::*;
use super::*;
use crate::board::{spawn_board, BoardConfig, BoardState};
use crate::policy::PolicyConfig;
use axum::extract::{Query as UrlQuery, State};
use axum::Json;
use sx_core::{DyadTask, FakeClock, Heartbeat, HumanTask, TaskPatch};

fn ctx() -> Arc<ListenCtx> {
    ctx_with_policy(PolicyConfig::default())
}

fn ctx_with_policy(policy: PolicyConfig) -> Arc<ListenCtx> {
    let board = spawn_board(
        BoardState::default(),
        BoardConfig { policy, ..BoardConfig::default() },
        FakeClock::new(),
    );
    Arc::new(ListenCtx { board, start_time: Instant::now() })
}

fn task(title: &str, dyad: &str) -> DyadTask {
    DyadTask { title: title.to_string(), dyad: dyad.to_string(), ..DyadTask::default() }
}

#[tokio::test]
async fn heartbeat_returns_204_then_shows_in_beats() {
    let ctx = ctx();
    let code = post_heartbeat(
        State(Arc::clone(&ctx)),
        Json(Heartbeat { dyad: "alpha".to_string(), ..Heartbeat::default() }),
    )
    .await
    .unwrap();
    assert_eq!(code, StatusCode::NO_CONTENT);

    let Json(beats) = get_beats(State(ctx)).await.unwrap();
    assert_eq!(beats.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn heartbeat_without_dyad_is_400() {
    let err = post_heartbeat(State(ctx()), Json(Heartbeat::default())).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn human_task_requires_commands() {
    let err = post_human_task(
        State(ctx()),
        Json(HumanTask { title: "reset".to_string(), ..HumanTask::default() }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn human_task_complete_is_idempotent_and_404s_unknown() {
    let ctx = ctx();
    post_human_task(
        State(Arc::clone(&ctx)),
        Json(HumanTask {
            title: "reset".to_string(),
            commands: "run".to_string(),
            ..HumanTask::default()
        }),
    )
    .await
    .unwrap();

    for _ in 0..2 {
        let code = post_human_task_complete(
            State(Arc::clone(&ctx)),
            UrlQuery(IdParam { id: Some(1) }),
        )
        .await
        .unwrap();
        assert_eq!(code, StatusCode::NO_CONTENT);
    }

    let err = post_human_task_complete(State(ctx), UrlQuery(IdParam { id: Some(9) }))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dyad_task_create_and_update_statuses() {
    let ctx = ctx();
    let Json(created) =
        post_dyad_task(State(Arc::clone(&ctx)), Json(task("fix", "alpha"))).await.unwrap();
    assert_eq!(created["id"], 1);

    let Json(updated) = post_dyad_task_update(
        State(Arc::clone(&ctx)),
        Json(TaskPatch { id: 1, notes: "wip".to_string(), ..TaskPatch::default() }),
    )
    .await
    .unwrap();
    assert_eq!(updated["notes"], "wip");

    let err = post_dyad_task_update(
        State(ctx),
        Json(TaskPatch { id: 42, notes: "x".to_string(), ..TaskPatch::default() }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wip_cap_maps_to_409() {
    let policy = PolicyConfig { max_open_per_dyad: 2, ..PolicyConfig::default() };
    let ctx = ctx_with_policy(policy);
    for i in 0..2 {
        post_dyad_task(State(Arc::clone(&ctx)), Json(task(&format!("t{i}"), "alpha")))
            .await
            .unwrap();
    }

    let err = post_dyad_task(State(Arc::clone(&ctx)), Json(task("t3", "alpha")))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(err.message, "dyad at capacity");

    // Updating one of the existing two still succeeds.
    let result = post_dyad_task_update(
        State(ctx),
        Json(TaskPatch { id: 1, notes: "still fine".to_string(), ..TaskPatch::default() }),
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn claim_validation_and_conflicts() {
    let ctx = ctx();
    post_dyad_task(State(Arc::clone(&ctx)), Json(task("fix", "alpha"))).await.unwrap();

    // Missing critic → 400.
    let err = post_dyad_task_claim(
        State(Arc::clone(&ctx)),
        Json(serde_json::from_value(serde_json::json!({"id": 1, "dyad": "alpha"})).unwrap()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    // Claim succeeds.
    let Json(claimed) = post_dyad_task_claim(
        State(Arc::clone(&ctx)),
        Json(
            serde_json::from_value(
                serde_json::json!({"id": 1, "dyad": "alpha", "critic": "c1"}),
            )
            .unwrap(),
        ),
    )
    .await
    .unwrap();
    assert_eq!(claimed["claimed_by"], "c1");
    assert_eq!(claimed["status"], "in_progress");

    // Another critic while the lease is fresh → 409.
    let err = post_dyad_task_claim(
        State(Arc::clone(&ctx)),
        Json(
            serde_json::from_value(
                serde_json::json!({"id": 1, "dyad": "alpha", "critic": "c2"}),
            )
            .unwrap(),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);

    // Unknown id → 404.
    let err = post_dyad_task_claim(
        State(ctx),
        Json(
            serde_json::from_value(
                serde_json::json!({"id": 99, "dyad": "alpha", "critic": "c1"}),
            )
            .unwrap(),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn access_request_resolution_statuses() {
    let ctx = ctx();
    post_access_request(
        State(Arc::clone(&ctx)),
        Json(sx_core::AccessRequest {
            requester: "critic-1".to_string(),
            resource: "prod".to_string(),
            action: "deploy".to_string(),
            ..sx_core::AccessRequest::default()
        }),
    )
    .await
    .unwrap();

    // Bad status value → 400.
    let err = post_access_request_resolve(
        State(Arc::clone(&ctx)),
        UrlQuery(
            serde_json::from_value(serde_json::json!({"id": 1, "status": "maybe"})).unwrap(),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    // Unknown id → 404.
    let err = post_access_request_resolve(
        State(Arc::clone(&ctx)),
        UrlQuery(
            serde_json::from_value(serde_json::json!({"id": 7, "status": "approved"})).unwrap(),
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);

    // Valid resolution → 200 with the updated record.
    let Json(resolved) = post_access_request_resolve(
        State(ctx),
        UrlQuery(
            serde_json::from_value(
                serde_json::json!({"id": 1, "status": "approved", "by": "ops"}),
            )
            .unwrap(),
        ),
    )
    .await
    .unwrap();
    assert_eq!(resolved["status"], "approved");
    assert_eq!(resolved["resolved_by"], "ops");
}

#[tokio::test]
async fn healthz_reports_counts_and_uptime() {
    let ctx = ctx();
    post_dyad_task(State(Arc::clone(&ctx)), Json(task("open", "alpha"))).await.unwrap();

    let Json(health) = get_healthz(State(ctx)).await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["tasks_open"], 1);
    assert!(health["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn metric_requires_name() {
    let err = post_metric(State(ctx()), Json(sx_core::Metric::default())).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}
