// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The substrate capability set.
//!
//! Everything the manager needs from a container runtime, keyed by
//! (dyad, member):
//!
//! - discovery by label (`silexa.dyad`, `silexa.member`)
//! - lifecycle: ensure (idempotent create/start), restart, remove
//! - exec with collected output, with or without a sized TTY
//!
//! Failure semantics: adapters do not retry; substrate errors surface with
//! the original error text. Not-found is distinguished from I/O failure so
//! `dyad_ready` can answer `(false, false)` without erroring.

pub(crate) mod docker;
pub(crate) mod k8s;
pub mod spec;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use docker::DockerSubstrate;
pub use k8s::K8sSubstrate;
pub use spec::{member_alias, member_labels, network_name, profile_volume, DyadSpec};

use async_trait::async_trait;
use sx_core::Member;
use thiserror::Error;

/// Errors from substrate operations
#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("exec failed: {0}")]
    ExecFailed(String),
    #[error("substrate error: {0}")]
    Runtime(String),
}

impl SubstrateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SubstrateError::NotFound(_))
    }
}

/// Options for ensuring a dyad's container pair exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureOptions {
    pub dyad: String,
    /// Image for the actor member (initializes the assistant profile, then
    /// blocks).
    pub actor_image: String,
    /// Image for the critic member (runs the control loop).
    pub critic_image: String,
    /// Host directory mounted as the shared workspace.
    pub workspace_dir: String,
    /// Host directory with assistant/config material.
    pub configs_dir: String,
    /// Substrate control socket mounted into the critic for nested control.
    pub substrate_socket: String,
}

/// The two container ids of an ensured dyad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DyadIds {
    pub actor: String,
    pub critic: String,
}

/// Collected output of an exec.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    pub fn stdout_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Adapter over a container runtime.
#[async_trait]
pub trait Substrate: Send + Sync + 'static {
    /// Check a dyad's container pair.
    ///
    /// `exists` iff both member containers are discoverable by label;
    /// `ready` iff both are running. Absence is not an error.
    async fn dyad_ready(&self, dyad: &str) -> Result<(bool, bool), SubstrateError>;

    /// Resolve the container id of one member.
    async fn resolve_member(&self, dyad: &str, member: Member)
        -> Result<String, SubstrateError>;

    /// Restart both members with a bounded graceful timeout (10 s) then
    /// force. Actor first, then critic.
    async fn restart_dyad(&self, dyad: &str) -> Result<(), SubstrateError>;

    /// Remove both members.
    async fn remove_dyad(&self, dyad: &str, force: bool) -> Result<(), SubstrateError>;

    /// Create the pair if either member is missing, start stopped members.
    /// Idempotent: calling twice yields the same two ids.
    async fn ensure_dyad(&self, opts: &EnsureOptions) -> Result<DyadIds, SubstrateError>;

    /// Run a command in a container, feed `stdin`, collect output.
    async fn exec(
        &self,
        container_id: &str,
        argv: &[String],
        stdin: &[u8],
    ) -> Result<ExecOutput, SubstrateError>;

    /// Run a command attached to a TTY of the given size and collect the
    /// raw terminal bytes.
    async fn exec_with_size(
        &self,
        container_id: &str,
        argv: &[String],
        rows: u16,
        cols: u16,
    ) -> Result<ExecOutput, SubstrateError>;

    /// Host-level argv that attaches an interactive TTY exec to the
    /// container (for callers that drive the terminal themselves, like the
    /// scraper's PTY session).
    fn interactive_exec_argv(&self, container_id: &str, argv: &[String]) -> Vec<String>;
}
