// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Usage probing.
//!
//! The probe is dual-mode behind one trait: the local subprocess RPC is
//! preferred when an assistant profile resolves on this filesystem, and a
//! container exec with the same argv is the fallback. Scrape enrichment
//! (model, effort, session) is layered on by the controller so unit tests
//! can inject a deterministic [`Prober`].

pub mod parse;
pub mod rpc;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use sx_adapters::{Substrate, SubstrateError};
use sx_core::{AccountDescriptor, Member, UsageSnapshot};
use thiserror::Error;

/// Errors from usage probes
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("probe timed out")]
    Timeout,
    #[error("auth required: {0}")]
    Auth(String),
    #[error("unreadable usage output: {0}")]
    Parse(String),
    #[error("substrate error: {0}")]
    Substrate(String),
}

impl From<SubstrateError> for ProbeError {
    fn from(e: SubstrateError) -> Self {
        ProbeError::Substrate(e.to_string())
    }
}

impl ProbeError {
    /// Short note for the status cache (and its emoji classifier).
    pub fn status_note(&self) -> String {
        match self {
            ProbeError::Auth(_) => "auth required".to_string(),
            ProbeError::Timeout => "timeout".to_string(),
            ProbeError::Spawn(note)
            | ProbeError::Parse(note)
            | ProbeError::Substrate(note) => note.clone(),
        }
    }
}

/// A source of usage snapshots.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(
        &self,
        account: &AccountDescriptor,
        member: Member,
    ) -> Result<UsageSnapshot, ProbeError>;
}

/// Production prober: local RPC first, container exec second.
pub struct UsageProber {
    substrate: Arc<dyn Substrate>,
    assistant_bin: String,
    shadow_root: PathBuf,
}

impl UsageProber {
    pub fn new(substrate: Arc<dyn Substrate>, shadow_root: PathBuf) -> Self {
        Self { substrate, assistant_bin: "codex".to_string(), shadow_root }
    }

    pub fn with_assistant_bin(mut self, bin: impl Into<String>) -> Self {
        self.assistant_bin = bin.into();
        self
    }

    async fn probe_via_exec(
        &self,
        account: &AccountDescriptor,
        member: Member,
    ) -> Result<UsageSnapshot, ProbeError> {
        let container = self.substrate.resolve_member(&account.dyad, member).await?;
        let argv = vec![self.assistant_bin.clone(), "app-server".to_string()];
        let output = self
            .substrate
            .exec(&container, &argv, rpc::request_batch().as_bytes())
            .await?;
        rpc::parse_rpc_output(&output.stdout)
    }
}

#[async_trait]
impl Prober for UsageProber {
    async fn probe(
        &self,
        account: &AccountDescriptor,
        member: Member,
    ) -> Result<UsageSnapshot, ProbeError> {
        if let Some(profile) = rpc::resolve_profile_dir(account, member) {
            let shadow = self.shadow_root.join(format!("{}-{}", account.dyad, member));
            match rpc::prepare_shadow_home(&shadow, &profile) {
                Ok(home) => match rpc::probe_local(&self.assistant_bin, &home).await {
                    Ok(snapshot) => return Ok(snapshot),
                    Err(ProbeError::Auth(m)) => return Err(ProbeError::Auth(m)),
                    Err(e) => {
                        tracing::debug!(
                            dyad = %account.dyad,
                            %member,
                            error = %e,
                            "local probe failed, falling back to exec"
                        );
                    }
                },
                Err(e) => {
                    tracing::debug!(dyad = %account.dyad, error = %e, "shadow home setup failed");
                }
            }
        }
        self.probe_via_exec(account, member).await
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Deterministic prober for tests: scripted per (dyad, member).
    #[derive(Default)]
    pub struct FakeProber {
        responses: Mutex<HashMap<(String, Member), Result<UsageSnapshot, String>>>,
    }

    impl FakeProber {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn script(&self, dyad: &str, member: Member, snapshot: UsageSnapshot) {
            self.responses.lock().insert((dyad.to_string(), member), Ok(snapshot));
        }

        pub fn script_error(&self, dyad: &str, member: Member, note: &str) {
            self.responses.lock().insert((dyad.to_string(), member), Err(note.to_string()));
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(
            &self,
            account: &AccountDescriptor,
            member: Member,
        ) -> Result<UsageSnapshot, ProbeError> {
            match self.responses.lock().get(&(account.dyad.clone(), member)) {
                Some(Ok(snapshot)) => Ok(snapshot.clone()),
                Some(Err(note)) => Err(ProbeError::Parse(note.clone())),
                None => Err(ProbeError::Parse("usage missing".to_string())),
            }
        }
    }
}
