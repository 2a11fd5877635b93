// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable board: one long-lived workflow owns every piece of mutable
//! state.
//!
//! Mutations enter only as [`sx_core::Signal`]s; reads only as [`Query`]s.
//! The HTTP layer and the controller hold a [`BoardHandle`] and no state of
//! their own. Persistence is a single JSON document rewritten after each
//! applied mutation.

mod dyads;
mod humans;
pub mod persist;
mod records;
mod state;
mod tasks;
pub mod workflow;

pub use state::{Applied, BoardState};
pub use workflow::{
    spawn_board, BoardConfig, BoardHandle, HealthzInfo, Query, QueryReply, SupportedUpdates,
};

use thiserror::Error;

/// Milliseconds after which a claim lease goes stale and may be stolen.
pub const STALE_LEASE_MS: u64 = 5 * 60 * 1000;

/// Errors from board operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The running workflow predates this update handler; callers fall back
    /// to signal + query.
    #[error("unknown update: {0}")]
    UnknownUpdate(String),
    #[error("board workflow is gone")]
    Closed,
}

#[cfg(test)]
#[path = "state_tests/mod.rs"]
mod state_tests;
