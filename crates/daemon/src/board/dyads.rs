// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dyad registry and heartbeat signal handlers.

use super::state::{Applied, BoardState};
use super::BoardError;
use sx_core::{validate_slug, Dyad, DyadUpdate, Heartbeat, BEATS_RING_CAP};

pub(super) fn upsert(
    state: &mut BoardState,
    update: DyadUpdate,
) -> Result<Applied, BoardError> {
    validate_slug(&update.dyad).map_err(|e| BoardError::Invalid(e.to_string()))?;

    let dyad = match state.dyads.get_mut(&update.dyad) {
        Some(existing) => {
            existing.merge(&update);
            existing.clone()
        }
        None => {
            let created = Dyad::from_update(&update);
            state.dyads.insert(update.dyad.clone(), created.clone());
            created
        }
    };
    Ok(Applied::Dyad(dyad))
}

pub(super) fn heartbeat(
    state: &mut BoardState,
    mut beat: Heartbeat,
    now_ms: u64,
) -> Result<Applied, BoardError> {
    if beat.dyad.trim().is_empty() {
        return Err(BoardError::Invalid("dyad required".to_string()));
    }

    state.next_beat_id += 1;
    beat.id = state.next_beat_id;
    beat.at_ms = now_ms;
    state.beats.push_back(beat.clone());
    while state.beats.len() > BEATS_RING_CAP {
        state.beats.pop_front();
    }

    // Derive the dyad record: first beat registers, later beats refresh.
    match state.dyads.get_mut(&beat.dyad) {
        Some(dyad) => dyad.beat(now_ms, &beat.status, &beat.message),
        None => {
            let mut dyad = Dyad::from_update(&DyadUpdate {
                dyad: beat.dyad.clone(),
                ..DyadUpdate::default()
            });
            dyad.beat(now_ms, &beat.status, &beat.message);
            state.dyads.insert(beat.dyad.clone(), dyad);
        }
    }

    Ok(Applied::Heartbeat(beat))
}
