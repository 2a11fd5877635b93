// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker substrate — drives the local container runtime through the
//! docker CLI.
//!
//! Containers are discovered by label rather than name so operators can
//! rename containers without breaking the manager. Lifecycle commands go
//! through one `run_docker` helper that surfaces stderr verbatim; the
//! adapter never retries.

use super::spec::{DyadSpec, MemberSpec, LABEL_DYAD, LABEL_MEMBER};
use super::{DyadIds, EnsureOptions, ExecOutput, Substrate, SubstrateError};
use async_trait::async_trait;
use std::process::Stdio;
use sx_core::Member;
use tokio::io::AsyncWriteExt;

/// Graceful stop window before docker falls back to SIGKILL.
const RESTART_TIMEOUT_SECS: u32 = 10;

/// Substrate adapter over the docker CLI.
#[derive(Clone, Default)]
pub struct DockerSubstrate;

impl DockerSubstrate {
    pub fn new() -> Self {
        Self
    }

    /// List `id\tstate` for one member of a dyad.
    async fn member_row(
        &self,
        dyad: &str,
        member: Member,
    ) -> Result<Option<(String, String)>, SubstrateError> {
        let filter_dyad = format!("label={}={}", LABEL_DYAD, dyad);
        let filter_member = format!("label={}={}", LABEL_MEMBER, member);
        let out = run_docker(&[
            "ps",
            "-a",
            "--filter",
            &filter_dyad,
            "--filter",
            &filter_member,
            "--format",
            "{{.ID}}\t{{.State}}",
        ])
        .await
        .map_err(SubstrateError::Runtime)?;

        Ok(out.lines().next().and_then(|line| {
            let mut parts = line.splitn(2, '\t');
            match (parts.next(), parts.next()) {
                (Some(id), Some(state)) if !id.is_empty() => {
                    Some((id.to_string(), state.to_string()))
                }
                _ => None,
            }
        }))
    }

    async fn ensure_member(
        &self,
        spec: &DyadSpec,
        member: Member,
    ) -> Result<String, SubstrateError> {
        match self.member_row(&spec.dyad, member).await? {
            Some((id, state)) => {
                if state != "running" {
                    run_docker(&["start", &id]).await.map_err(SubstrateError::Runtime)?;
                }
                Ok(id)
            }
            None => {
                let args = docker_run_args(spec, member);
                let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
                let id = run_docker(&arg_refs).await.map_err(SubstrateError::Runtime)?;
                tracing::info!(dyad = %spec.dyad, %member, container = %id, "created dyad member");
                Ok(id)
            }
        }
    }
}

#[async_trait]
impl Substrate for DockerSubstrate {
    async fn dyad_ready(&self, dyad: &str) -> Result<(bool, bool), SubstrateError> {
        let actor = self.member_row(dyad, Member::Actor).await?;
        let critic = self.member_row(dyad, Member::Critic).await?;
        let exists = actor.is_some() && critic.is_some();
        let running =
            |row: &Option<(String, String)>| matches!(row, Some((_, state)) if state == "running");
        let ready = running(&actor) && running(&critic);
        Ok((exists, ready))
    }

    async fn resolve_member(
        &self,
        dyad: &str,
        member: Member,
    ) -> Result<String, SubstrateError> {
        self.member_row(dyad, member)
            .await?
            .map(|(id, _)| id)
            .ok_or_else(|| SubstrateError::NotFound(format!("{} {} container", dyad, member)))
    }

    async fn restart_dyad(&self, dyad: &str) -> Result<(), SubstrateError> {
        // Actor first, then critic: the critic's control loop reconnects to
        // a fresh actor instead of racing a dying one.
        let timeout = RESTART_TIMEOUT_SECS.to_string();
        for member in Member::ALL {
            let id = self.resolve_member(dyad, member).await?;
            run_docker(&["restart", "-t", &timeout, &id])
                .await
                .map_err(SubstrateError::Runtime)?;
            tracing::info!(%dyad, %member, container = %id, "restarted dyad member");
        }
        Ok(())
    }

    async fn remove_dyad(&self, dyad: &str, force: bool) -> Result<(), SubstrateError> {
        for member in Member::ALL {
            let row = self.member_row(dyad, member).await?;
            if let Some((id, _)) = row {
                let result = if force {
                    run_docker(&["rm", "-f", &id]).await
                } else {
                    run_docker(&["rm", &id]).await
                };
                result.map_err(SubstrateError::Runtime)?;
            }
        }
        Ok(())
    }

    async fn ensure_dyad(&self, opts: &EnsureOptions) -> Result<DyadIds, SubstrateError> {
        let spec = DyadSpec::build(opts);

        // Network and volume creates tolerate "already exists" so ensure
        // stays idempotent.
        if let Err(e) = run_docker(&["network", "create", &spec.network]).await {
            if !e.contains("already exists") {
                return Err(SubstrateError::Runtime(e));
            }
        }
        run_docker(&["volume", "create", &spec.profile_volume])
            .await
            .map_err(SubstrateError::Runtime)?;

        let actor = self.ensure_member(&spec, Member::Actor).await?;
        let critic = self.ensure_member(&spec, Member::Critic).await?;
        Ok(DyadIds { actor, critic })
    }

    async fn exec(
        &self,
        container_id: &str,
        argv: &[String],
        stdin: &[u8],
    ) -> Result<ExecOutput, SubstrateError> {
        let mut cmd = tokio::process::Command::new("docker");
        cmd.arg("exec").arg("-i").arg(container_id).args(argv);
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| SubstrateError::ExecFailed(format!("failed to exec docker: {}", e)))?;

        if let Some(mut child_stdin) = child.stdin.take() {
            child_stdin
                .write_all(stdin)
                .await
                .map_err(|e| SubstrateError::ExecFailed(format!("stdin write failed: {}", e)))?;
            drop(child_stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;
        Ok(ExecOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }

    async fn exec_with_size(
        &self,
        container_id: &str,
        argv: &[String],
        rows: u16,
        cols: u16,
    ) -> Result<ExecOutput, SubstrateError> {
        // docker exec has no size flag; the TUI reads LINES/COLUMNS.
        let lines = format!("LINES={}", rows);
        let columns = format!("COLUMNS={}", cols);
        let mut cmd = tokio::process::Command::new("docker");
        cmd.arg("exec")
            .arg("-t")
            .arg("-e")
            .arg(&lines)
            .arg("-e")
            .arg(&columns)
            .arg(container_id)
            .args(argv);
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|e| SubstrateError::ExecFailed(format!("failed to exec docker: {}", e)))?;
        Ok(ExecOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }

    fn interactive_exec_argv(&self, container_id: &str, argv: &[String]) -> Vec<String> {
        let mut full = vec![
            "docker".to_string(),
            "exec".to_string(),
            "-it".to_string(),
            container_id.to_string(),
        ];
        full.extend(argv.iter().cloned());
        full
    }
}

/// Build the `docker run` argv for one member of a dyad spec.
pub(crate) fn docker_run_args(spec: &DyadSpec, member: Member) -> Vec<String> {
    let member_spec: &MemberSpec = spec.member(member);
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        member_spec.name.clone(),
        "--restart".to_string(),
        "unless-stopped".to_string(),
        "--network".to_string(),
        spec.network.clone(),
        "--network-alias".to_string(),
        member_spec.alias.clone(),
    ];
    for (key, value) in &member_spec.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }
    for (src, dst) in &member_spec.mounts {
        args.push("-v".to_string());
        args.push(format!("{}:{}", src, dst));
    }
    args.push(member_spec.image.clone());
    args.extend(member_spec.entrypoint.iter().cloned());
    args
}

/// Run a docker CLI command and return stdout on success.
async fn run_docker(args: &[&str]) -> Result<String, String> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| format!("failed to exec docker: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("docker {} failed: {}", args.first().unwrap_or(&""), stderr.trim()))
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
