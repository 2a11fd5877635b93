// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The board workflow task and its client handle.
//!
//! One spawned task owns [`BoardState`]. Clients talk to it through a
//! [`BoardHandle`]: fire-and-forget signals, update-style calls that
//! return the affected record, and snapshot queries.
//!
//! # Update compatibility
//!
//! A workflow built before an update handler existed reports
//! [`BoardError::UnknownUpdate`]. The handle then rewrites the call as the
//! equivalent signal plus a follow-up query and reconstructs the return
//! value from the query result. Signals are at-least-once, so handlers are
//! idempotent and the rewrite is safe.

use super::persist;
use super::state::{Applied, BoardState};
use super::BoardError;
use crate::policy::PolicyConfig;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use sx_core::{
    AccessRequest, Clock, Dyad, DyadTask, Feedback, Heartbeat, HumanTask, Metric, Signal,
};
use tokio::sync::{mpsc, oneshot};

/// Read-only views over board state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    DyadTasks,
    Dyads,
    HumanTasks,
    Feedback,
    AccessRequests,
    Metrics,
    Beats,
    Healthz,
    DyadDigestMessageId,
}

/// Health summary served by `/healthz`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthzInfo {
    pub status: String,
    pub tasks_open: usize,
    pub access_pending: usize,
    pub metrics_count: usize,
    pub beats_recent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_beat: Option<Heartbeat>,
}

/// Snapshot answers to queries.
#[derive(Debug, Clone)]
pub enum QueryReply {
    DyadTasks(Vec<DyadTask>),
    Dyads(Vec<Dyad>),
    HumanTasks(Vec<HumanTask>),
    Feedback(Vec<Feedback>),
    AccessRequests(Vec<AccessRequest>),
    Metrics(Vec<Metric>),
    Beats(Vec<Heartbeat>),
    Healthz(HealthzInfo),
    DyadDigestMessageId(i64),
}

enum Command {
    Signal(Signal),
    Update { signal: Signal, reply: oneshot::Sender<Result<Applied, BoardError>> },
    Query { query: Query, reply: oneshot::Sender<QueryReply> },
}

/// Which update handlers the running workflow knows. Production workflows
/// know all of them; tests shrink the set to exercise the compat shim.
#[derive(Debug, Clone)]
pub struct SupportedUpdates {
    unknown: HashSet<&'static str>,
}

impl SupportedUpdates {
    pub fn all() -> Self {
        Self { unknown: HashSet::new() }
    }

    /// Mark update handlers as missing, as an older deployment would be.
    pub fn without(names: &[&'static str]) -> Self {
        Self { unknown: names.iter().copied().collect() }
    }

    fn knows(&self, name: &str) -> bool {
        !self.unknown.contains(name)
    }
}

/// Client handle onto the board workflow.
#[derive(Clone)]
pub struct BoardHandle {
    tx: mpsc::Sender<Command>,
}

impl BoardHandle {
    /// Fire-and-forget signal (at-least-once; errors inside the workflow
    /// are logged, not returned).
    pub async fn signal(&self, signal: Signal) -> Result<(), BoardError> {
        self.tx.send(Command::Signal(signal)).await.map_err(|_| BoardError::Closed)
    }

    /// Update-style call: validate, apply, and return the affected record.
    /// Falls back to signal + query against workflows that predate the
    /// handler.
    pub async fn update(&self, signal: Signal) -> Result<Applied, BoardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Update { signal: signal.clone(), reply: reply_tx })
            .await
            .map_err(|_| BoardError::Closed)?;
        match reply_rx.await.map_err(|_| BoardError::Closed)? {
            Err(BoardError::UnknownUpdate(name)) => {
                tracing::debug!(update = %name, "server lacks update handler, using signal+query");
                self.update_via_signal(signal).await
            }
            other => other,
        }
    }

    /// The compat path: deliver the mutation as a signal, then reconstruct
    /// the return value from a query.
    async fn update_via_signal(&self, signal: Signal) -> Result<Applied, BoardError> {
        self.signal(signal.clone()).await?;
        match signal {
            Signal::CompleteHumanTask { id } => {
                let tasks = self.human_tasks().await?;
                tasks
                    .into_iter()
                    .find(|t| t.id == id)
                    .map(Applied::HumanTask)
                    .ok_or_else(|| BoardError::NotFound(format!("no human task {}", id)))
            }
            Signal::ClaimDyadTask { id, .. } | Signal::UpdateDyadTask(sx_core::TaskPatch { id, .. }) => {
                let tasks = self.dyad_tasks().await?;
                tasks
                    .into_iter()
                    .find(|t| t.id == id)
                    .map(|task| Applied::DyadTask { task, notify: false })
                    .ok_or_else(|| BoardError::NotFound(format!("no task {}", id)))
            }
            Signal::AddDyadTask(ref task) => {
                // Server assigned the id; the freshest task with this title
                // is ours under the single-writer ordering guarantee.
                let tasks = self.dyad_tasks().await?;
                tasks
                    .into_iter()
                    .filter(|t| t.title == task.title)
                    .max_by_key(|t| t.id)
                    .map(|task| Applied::DyadTask { task, notify: false })
                    .ok_or_else(|| BoardError::NotFound("task not created".to_string()))
            }
            _ => Ok(Applied::None),
        }
    }

    pub async fn query(&self, query: Query) -> Result<QueryReply, BoardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Query { query, reply: reply_tx })
            .await
            .map_err(|_| BoardError::Closed)?;
        reply_rx.await.map_err(|_| BoardError::Closed)
    }

    pub async fn dyad_tasks(&self) -> Result<Vec<DyadTask>, BoardError> {
        match self.query(Query::DyadTasks).await? {
            QueryReply::DyadTasks(tasks) => Ok(tasks),
            _ => Err(BoardError::Closed),
        }
    }

    pub async fn dyads(&self) -> Result<Vec<Dyad>, BoardError> {
        match self.query(Query::Dyads).await? {
            QueryReply::Dyads(dyads) => Ok(dyads),
            _ => Err(BoardError::Closed),
        }
    }

    pub async fn human_tasks(&self) -> Result<Vec<HumanTask>, BoardError> {
        match self.query(Query::HumanTasks).await? {
            QueryReply::HumanTasks(tasks) => Ok(tasks),
            _ => Err(BoardError::Closed),
        }
    }

    pub async fn digest_message_id(&self) -> Result<i64, BoardError> {
        match self.query(Query::DyadDigestMessageId).await? {
            QueryReply::DyadDigestMessageId(id) => Ok(id),
            _ => Err(BoardError::Closed),
        }
    }
}

/// Configuration for spawning the board workflow.
pub struct BoardConfig {
    pub policy: PolicyConfig,
    /// When set, state is rewritten here after every applied mutation.
    pub state_path: Option<PathBuf>,
    /// Dyad-task changes worth projecting flow out here.
    pub task_events: Option<mpsc::Sender<DyadTask>>,
    pub supported_updates: SupportedUpdates,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            state_path: None,
            task_events: None,
            supported_updates: SupportedUpdates::all(),
        }
    }
}

/// Spawn the board workflow task. The returned handle is the only way in.
pub fn spawn_board<C: Clock + 'static>(
    initial: BoardState,
    config: BoardConfig,
    clock: C,
) -> BoardHandle {
    let (tx, rx) = mpsc::channel(256);
    tokio::spawn(run_board(initial, config, clock, rx));
    BoardHandle { tx }
}

async fn run_board<C: Clock>(
    mut state: BoardState,
    config: BoardConfig,
    clock: C,
    mut rx: mpsc::Receiver<Command>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Signal(signal) => {
                let name = signal.name();
                match state.apply(signal, clock.epoch_ms(), &config.policy) {
                    Ok(applied) => {
                        after_apply(&state, &config, &applied).await;
                    }
                    Err(e) => tracing::warn!(signal = name, error = %e, "signal rejected"),
                }
            }
            Command::Update { signal, reply } => {
                let name = signal.name();
                let result = if config.supported_updates.knows(name) {
                    state.apply(signal, clock.epoch_ms(), &config.policy)
                } else {
                    Err(BoardError::UnknownUpdate(name.to_string()))
                };
                if let Ok(applied) = &result {
                    after_apply(&state, &config, applied).await;
                }
                let _ = reply.send(result);
            }
            Command::Query { query, reply } => {
                let _ = reply.send(answer(&state, query));
            }
        }
    }
}

async fn after_apply(state: &BoardState, config: &BoardConfig, applied: &Applied) {
    if let Some(path) = &config.state_path {
        if let Err(e) = persist::save(path, state) {
            tracing::warn!(error = %e, "state save failed");
        }
    }
    if let (Some(events), Applied::DyadTask { task, notify: true }) =
        (&config.task_events, applied)
    {
        let _ = events.send(task.clone()).await;
    }
}

fn answer(state: &BoardState, query: Query) -> QueryReply {
    match query {
        Query::DyadTasks => QueryReply::DyadTasks(state.dyad_tasks.values().cloned().collect()),
        Query::Dyads => QueryReply::Dyads(state.dyads.values().cloned().collect()),
        Query::HumanTasks => {
            QueryReply::HumanTasks(state.human_tasks.values().cloned().collect())
        }
        Query::Feedback => QueryReply::Feedback(state.feedback.clone()),
        Query::AccessRequests => {
            QueryReply::AccessRequests(state.access_requests.values().cloned().collect())
        }
        Query::Metrics => QueryReply::Metrics(state.metrics.clone()),
        Query::Beats => QueryReply::Beats(state.beats.iter().cloned().collect()),
        Query::Healthz => QueryReply::Healthz(HealthzInfo {
            status: "ok".to_string(),
            tasks_open: state.open_tasks().count(),
            access_pending: state
                .access_requests
                .values()
                .filter(|r| r.status == sx_core::AccessStatus::Pending)
                .count(),
            metrics_count: state.metrics.len(),
            beats_recent: state.beats.len(),
            last_beat: state.beats.back().cloned(),
        }),
        Query::DyadDigestMessageId => {
            QueryReply::DyadDigestMessageId(state.dyad_digest_message_id)
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
