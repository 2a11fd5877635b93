// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory substrate for tests: scripted containers, recorded calls.

use super::{DyadIds, EnsureOptions, ExecOutput, Substrate, SubstrateError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use sx_core::Member;

/// A recorded substrate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstrateCall {
    DyadReady(String),
    Resolve(String, Member),
    Restart(String),
    Remove(String, bool),
    Ensure(String),
    Exec(String, Vec<String>),
    ExecWithSize(String, Vec<String>, u16, u16),
}

#[derive(Default)]
struct FakeMember {
    id: String,
    running: bool,
}

#[derive(Default)]
struct Inner {
    members: HashMap<(String, Member), FakeMember>,
    exec_output: HashMap<String, Vec<u8>>,
    exec_error: Option<String>,
    calls: Vec<SubstrateCall>,
}

/// Scripted substrate. Containers and exec outputs are seeded up front;
/// every call is recorded for assertions.
#[derive(Clone, Default)]
pub struct FakeSubstrate {
    inner: Arc<Mutex<Inner>>,
}

impl FakeSubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a member container with the given id and running state.
    pub fn seed_member(&self, dyad: &str, member: Member, id: &str, running: bool) {
        self.inner.lock().members.insert(
            (dyad.to_string(), member),
            FakeMember { id: id.to_string(), running },
        );
    }

    /// Script the bytes returned by `exec` on a container id.
    pub fn seed_exec_output(&self, container_id: &str, output: &[u8]) {
        self.inner.lock().exec_output.insert(container_id.to_string(), output.to_vec());
    }

    /// Make every exec fail with the given message.
    pub fn fail_exec(&self, message: &str) {
        self.inner.lock().exec_error = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<SubstrateCall> {
        self.inner.lock().calls.clone()
    }

    fn record(&self, call: SubstrateCall) {
        self.inner.lock().calls.push(call);
    }
}

#[async_trait]
impl Substrate for FakeSubstrate {
    async fn dyad_ready(&self, dyad: &str) -> Result<(bool, bool), SubstrateError> {
        self.record(SubstrateCall::DyadReady(dyad.to_string()));
        let inner = self.inner.lock();
        let actor = inner.members.get(&(dyad.to_string(), Member::Actor));
        let critic = inner.members.get(&(dyad.to_string(), Member::Critic));
        let exists = actor.is_some() && critic.is_some();
        let ready = matches!(actor, Some(m) if m.running) && matches!(critic, Some(m) if m.running);
        Ok((exists, ready))
    }

    async fn resolve_member(
        &self,
        dyad: &str,
        member: Member,
    ) -> Result<String, SubstrateError> {
        self.record(SubstrateCall::Resolve(dyad.to_string(), member));
        self.inner
            .lock()
            .members
            .get(&(dyad.to_string(), member))
            .map(|m| m.id.clone())
            .ok_or_else(|| SubstrateError::NotFound(format!("{} {}", dyad, member)))
    }

    async fn restart_dyad(&self, dyad: &str) -> Result<(), SubstrateError> {
        self.record(SubstrateCall::Restart(dyad.to_string()));
        let mut inner = self.inner.lock();
        for member in Member::ALL {
            if let Some(m) = inner.members.get_mut(&(dyad.to_string(), member)) {
                m.running = true;
            }
        }
        Ok(())
    }

    async fn remove_dyad(&self, dyad: &str, force: bool) -> Result<(), SubstrateError> {
        self.record(SubstrateCall::Remove(dyad.to_string(), force));
        let mut inner = self.inner.lock();
        for member in Member::ALL {
            inner.members.remove(&(dyad.to_string(), member));
        }
        Ok(())
    }

    async fn ensure_dyad(&self, opts: &EnsureOptions) -> Result<DyadIds, SubstrateError> {
        self.record(SubstrateCall::Ensure(opts.dyad.clone()));
        let mut inner = self.inner.lock();
        for member in Member::ALL {
            let key = (opts.dyad.clone(), member);
            let entry = inner.members.entry(key).or_insert_with(|| FakeMember {
                id: format!("{}-{}", opts.dyad, member),
                running: false,
            });
            entry.running = true;
        }
        let id = |member: Member| {
            inner
                .members
                .get(&(opts.dyad.clone(), member))
                .map(|m| m.id.clone())
                .unwrap_or_default()
        };
        Ok(DyadIds { actor: id(Member::Actor), critic: id(Member::Critic) })
    }

    async fn exec(
        &self,
        container_id: &str,
        argv: &[String],
        _stdin: &[u8],
    ) -> Result<ExecOutput, SubstrateError> {
        self.record(SubstrateCall::Exec(container_id.to_string(), argv.to_vec()));
        let inner = self.inner.lock();
        if let Some(message) = &inner.exec_error {
            return Err(SubstrateError::ExecFailed(message.clone()));
        }
        let stdout = inner.exec_output.get(container_id).cloned().unwrap_or_default();
        Ok(ExecOutput { stdout, stderr: Vec::new(), exit_code: Some(0) })
    }

    async fn exec_with_size(
        &self,
        container_id: &str,
        argv: &[String],
        rows: u16,
        cols: u16,
    ) -> Result<ExecOutput, SubstrateError> {
        self.record(SubstrateCall::ExecWithSize(
            container_id.to_string(),
            argv.to_vec(),
            rows,
            cols,
        ));
        let inner = self.inner.lock();
        if let Some(message) = &inner.exec_error {
            return Err(SubstrateError::ExecFailed(message.clone()));
        }
        let stdout = inner.exec_output.get(container_id).cloned().unwrap_or_default();
        Ok(ExecOutput { stdout, stderr: Vec::new(), exit_code: Some(0) })
    }

    fn interactive_exec_argv(&self, container_id: &str, argv: &[String]) -> Vec<String> {
        let mut full = vec!["fake-exec".to_string(), container_id.to_string()];
        full.extend(argv.iter().cloned());
        full
    }
}
