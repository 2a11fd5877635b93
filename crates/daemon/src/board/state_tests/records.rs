// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sx_core::{
    AccessRequest, AccessStatus, DyadUpdate, Feedback, Heartbeat, Metric, BEATS_RING_CAP,
};

#[test]
fn beats_ring_caps_at_limit() {
    let mut state = BoardState::default();
    for i in 0..(BEATS_RING_CAP + 25) {
        apply(
            &mut state,
            Signal::Heartbeat(Heartbeat { dyad: "alpha".to_string(), ..Heartbeat::default() }),
            i as u64,
        )
        .unwrap();
    }
    assert_eq!(state.beats.len(), BEATS_RING_CAP);
    // The oldest beats were dropped; ids keep increasing.
    assert_eq!(state.beats.front().unwrap().id, 26);
    assert_eq!(state.beats.back().unwrap().id, (BEATS_RING_CAP + 25) as u64);
}

#[test]
fn heartbeat_derives_dyad_record() {
    let mut state = BoardState::default();
    apply(
        &mut state,
        Signal::Heartbeat(Heartbeat {
            dyad: "alpha".to_string(),
            status: "working".to_string(),
            ..Heartbeat::default()
        }),
        9_000,
    )
    .unwrap();

    let dyad = &state.dyads["alpha"];
    assert_eq!(dyad.last_heartbeat_ms, 9_000);
    assert_eq!(dyad.last_status, "working");
    assert!(dyad.available);
}

#[test]
fn upsert_merges_existing_dyad() {
    let mut state = BoardState::default();
    apply(
        &mut state,
        Signal::UpsertDyad(DyadUpdate {
            dyad: "alpha".to_string(),
            department: "eng".to_string(),
            ..DyadUpdate::default()
        }),
        1_000,
    )
    .unwrap();
    apply(
        &mut state,
        Signal::UpsertDyad(DyadUpdate {
            dyad: "alpha".to_string(),
            role: "builder".to_string(),
            ..DyadUpdate::default()
        }),
        2_000,
    )
    .unwrap();

    assert_eq!(state.dyads.len(), 1);
    let dyad = &state.dyads["alpha"];
    assert_eq!(dyad.department, "eng");
    assert_eq!(dyad.role, "builder");
}

#[test]
fn upsert_rejects_bad_slug() {
    let mut state = BoardState::default();
    let result = apply(
        &mut state,
        Signal::UpsertDyad(DyadUpdate { dyad: "Alpha!".to_string(), ..DyadUpdate::default() }),
        1_000,
    );
    assert!(matches!(result, Err(BoardError::Invalid(_))));
}

#[test]
fn resolve_access_request_verifies_id() {
    let mut state = BoardState::default();
    let result = apply(
        &mut state,
        Signal::ResolveAccessRequest {
            id: 3,
            status: AccessStatus::Approved,
            by: "ops".to_string(),
            notes: String::new(),
        },
        1_000,
    );
    assert!(matches!(result, Err(BoardError::NotFound(_))));
}

#[test]
fn access_request_lifecycle() {
    let mut state = BoardState::default();
    apply(
        &mut state,
        Signal::AddAccessRequest(AccessRequest {
            requester: "critic-1".to_string(),
            resource: "prod-db".to_string(),
            action: "read".to_string(),
            ..AccessRequest::default()
        }),
        1_000,
    )
    .unwrap();

    let applied = apply(
        &mut state,
        Signal::ResolveAccessRequest {
            id: 1,
            status: AccessStatus::Denied,
            by: "ops".to_string(),
            notes: "too broad".to_string(),
        },
        2_000,
    )
    .unwrap();

    match applied {
        Applied::AccessRequest(request) => {
            assert_eq!(request.status, AccessStatus::Denied);
            assert_eq!(request.resolved_by, "ops");
            assert_eq!(request.resolved_at_ms, 2_000);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn feedback_and_metric_require_payload() {
    let mut state = BoardState::default();
    assert!(matches!(
        apply(&mut state, Signal::AddFeedback(Feedback::default()), 1_000),
        Err(BoardError::Invalid(_))
    ));
    assert!(matches!(
        apply(&mut state, Signal::AddMetric(Metric::default()), 1_000),
        Err(BoardError::Invalid(_))
    ));
}

#[test]
fn metric_gets_server_id_and_timestamp() {
    let mut state = BoardState::default();
    let applied = apply(
        &mut state,
        Signal::AddMetric(Metric {
            name: "codex.remaining_pct".to_string(),
            value: 42.0,
            id: 999,
            at_ms: 123,
            ..Metric::default()
        }),
        7_000,
    )
    .unwrap();
    match applied {
        Applied::Metric(metric) => {
            assert_eq!(metric.id, 1, "client-supplied id is ignored");
            assert_eq!(metric.at_ms, 7_000, "client-supplied timestamp is ignored");
        }
        other => panic!("unexpected {:?}", other),
    }
}
