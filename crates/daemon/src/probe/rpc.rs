// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess JSON-RPC probe.
//!
//! The assistant binary is spawned in `app-server` mode with HOME pointed
//! at a private shadow home, a fixed batch of four requests is written to
//! stdin, stdin is closed, and JSON-object-per-line responses are read
//! until EOF or the 20 s deadline. The child is killed on timeout.

use super::ProbeError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use sx_core::{AccountDescriptor, Member, UsageSnapshot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Hard deadline for one RPC probe.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(20);

/// Request ids of the fixed batch.
const ID_INITIALIZE: u64 = 1;
const ID_RATE_LIMITS: u64 = 2;
const ID_ACCOUNT: u64 = 3;
const ID_CONFIG: u64 = 4;

/// The four-request batch, one JSON object per line.
pub fn request_batch() -> String {
    let requests = [
        serde_json::json!({"jsonrpc": "2.0", "id": ID_INITIALIZE, "method": "initialize", "params": {"clientInfo": {"name": "silexa-manager"}}}),
        serde_json::json!({"jsonrpc": "2.0", "id": ID_RATE_LIMITS, "method": "account/rateLimits/read"}),
        serde_json::json!({"jsonrpc": "2.0", "id": ID_ACCOUNT, "method": "account/read"}),
        serde_json::json!({"jsonrpc": "2.0", "id": ID_CONFIG, "method": "config/read"}),
    ];
    let mut batch = String::new();
    for request in requests {
        batch.push_str(&request.to_string());
        batch.push('\n');
    }
    batch
}

/// Resolve a writable assistant-profile directory for this account member.
///
/// The configured home wins; otherwise the conventional
/// `/data/silexa/<dyad>/<member>` path counts when it holds `auth.json`
/// or `config.toml`.
pub fn resolve_profile_dir(account: &AccountDescriptor, member: Member) -> Option<PathBuf> {
    if !account.home_dir.is_empty() {
        let path = PathBuf::from(&account.home_dir);
        if path.is_dir() {
            return Some(path);
        }
    }
    let conventional = PathBuf::from(format!("/data/silexa/{}/{}", account.dyad, member));
    if conventional.join("auth.json").exists() || conventional.join("config.toml").exists() {
        return Some(conventional);
    }
    None
}

/// Prepare a private shadow home whose `.codex` resolves to the profile.
///
/// Symlinks when the filesystem allows it; otherwise copies the two
/// profile files if absent, so repeated probes reuse the copy.
pub fn prepare_shadow_home(shadow_root: &Path, profile: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(shadow_root)?;
    let target = shadow_root.join(".codex");
    if target.exists() {
        return Ok(shadow_root.to_path_buf());
    }
    #[cfg(unix)]
    {
        if std::os::unix::fs::symlink(profile, &target).is_ok() {
            return Ok(shadow_root.to_path_buf());
        }
    }
    std::fs::create_dir_all(&target)?;
    for name in ["auth.json", "config.toml"] {
        let src = profile.join(name);
        let dst = target.join(name);
        if src.exists() && !dst.exists() {
            std::fs::copy(&src, &dst)?;
        }
    }
    Ok(shadow_root.to_path_buf())
}

/// Run the local subprocess probe against a resolved profile.
pub async fn probe_local(
    assistant_bin: &str,
    shadow_home: &Path,
) -> Result<UsageSnapshot, ProbeError> {
    let mut child = tokio::process::Command::new(assistant_bin)
        .arg("app-server")
        .env("HOME", shadow_home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ProbeError::Spawn(format!("{}: {}", assistant_bin, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(request_batch().as_bytes())
            .await
            .map_err(|e| ProbeError::Spawn(format!("stdin write failed: {}", e)))?;
        drop(stdin);
    }

    let stdout = child.stdout.take().ok_or_else(|| {
        ProbeError::Spawn("child stdout unavailable".to_string())
    })?;

    let read_all = async {
        let mut responses = HashMap::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(&line) else {
                continue;
            };
            if let Some(id) = value.get("id").and_then(|v| v.as_u64()) {
                responses.insert(id, value);
                if responses.len() == 4 {
                    break;
                }
            }
        }
        responses
    };

    let responses = match tokio::time::timeout(RPC_TIMEOUT, read_all).await {
        Ok(responses) => responses,
        Err(_) => {
            let _ = child.kill().await;
            return Err(ProbeError::Timeout);
        }
    };
    let _ = child.kill().await;

    if responses.is_empty() {
        return Err(ProbeError::Parse("no responses on stdout".to_string()));
    }
    parse_responses(&responses)
}

/// Assemble a snapshot from responses keyed by request id.
pub fn parse_responses(
    responses: &HashMap<u64, serde_json::Value>,
) -> Result<UsageSnapshot, ProbeError> {
    let mut snapshot = UsageSnapshot::unknown();

    if let Some(reply) = responses.get(&ID_RATE_LIMITS) {
        if let Some(error) = reply.get("error") {
            let message =
                error.get("message").and_then(|v| v.as_str()).unwrap_or("rate limit error");
            if message.to_lowercase().contains("not signed in")
                || message.to_lowercase().contains("login")
            {
                return Err(ProbeError::Auth(message.to_string()));
            }
            return Err(ProbeError::Parse(message.to_string()));
        }
        if let Some(result) = reply.get("result") {
            let (short, weekly) = super::parse::parse_rate_limits(result);
            snapshot.short = short;
            snapshot.weekly = weekly;
        }
    }

    if let Some(result) = responses.get(&ID_ACCOUNT).and_then(|r| r.get("result")) {
        if let Some(email) = result.get("email").and_then(|v| v.as_str()) {
            snapshot.email = super::parse::canonicalize_email(email);
        }
    }

    if let Some(result) = responses.get(&ID_CONFIG).and_then(|r| r.get("result")) {
        if let Some(model) = result.get("model").and_then(|v| v.as_str()) {
            snapshot.model = model.to_string();
        }
        if let Some(effort) = result.get("modelReasoningEffort").and_then(|v| v.as_str()) {
            snapshot.reasoning_effort = effort.to_string();
        }
    }

    if let Some(result) = responses.get(&ID_INITIALIZE).and_then(|r| r.get("result")) {
        if let Some(session) = result.get("sessionId").and_then(|v| v.as_str()) {
            snapshot.session_id = session.to_string();
        }
    }

    Ok(snapshot)
}

/// Parse raw exec output (JSON-object-per-line) the same way.
pub fn parse_rpc_output(stdout: &[u8]) -> Result<UsageSnapshot, ProbeError> {
    let text = String::from_utf8_lossy(stdout);
    let mut responses = HashMap::new();
    for line in text.lines() {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
            if let Some(id) = value.get("id").and_then(|v| v.as_u64()) {
                responses.insert(id, value);
            }
        }
    }
    if responses.is_empty() {
        return Err(ProbeError::Parse("no responses in exec output".to_string()));
    }
    parse_responses(&responses)
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
