// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::parse_duration;

/// Default board HTTP address.
const DEFAULT_ADDR: &str = "0.0.0.0:9090";
/// Default status-surface address.
const DEFAULT_MONITOR_ADDR: &str = "0.0.0.0:8086";

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn bool_var(name: &str) -> bool {
    matches!(var(name).as_deref(), Some("1") | Some("true") | Some("yes"))
}

/// Board HTTP listen address (`ADDR`).
pub fn addr() -> String {
    var("ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

/// Status-surface listen address (`CODEX_MONITOR_ADDR`).
pub fn monitor_addr() -> String {
    var("CODEX_MONITOR_ADDR").unwrap_or_else(|| DEFAULT_MONITOR_ADDR.to_string())
}

/// Data directory: `DATA_DIR` > `~/.local/state/silexa`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = var("DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local/state/silexa")
}

/// Persisted state file: `STATE_PATH` > `<DATA_DIR>/manager_state.json`.
pub fn state_path() -> PathBuf {
    var("STATE_PATH").map(PathBuf::from).unwrap_or_else(|| data_dir().join("manager_state.json"))
}

/// Remote manager base URL, when the controller runs apart from the board.
pub fn manager_url() -> Option<String> {
    var("MANAGER_URL")
}

/// Accounts config file (`CODEX_ACCOUNTS_FILE`).
pub fn accounts_file() -> Option<PathBuf> {
    var("CODEX_ACCOUNTS_FILE").map(PathBuf::from)
}

/// Controller poll interval override (`CODEX_STATUS_POLL_INTERVAL`).
pub fn status_poll_interval() -> Option<Duration> {
    var("CODEX_STATUS_POLL_INTERVAL").and_then(|s| parse_duration(&s).ok())
}

/// Cooldown threshold override (`CODEX_COOLDOWN_THRESHOLD_PCT`).
pub fn cooldown_threshold_pct() -> Option<f64> {
    var("CODEX_COOLDOWN_THRESHOLD_PCT").and_then(|s| s.parse().ok())
}

/// Plan limit in minutes (`CODEX_PLAN_LIMIT_MINUTES`).
pub fn plan_limit_minutes() -> Option<u64> {
    var("CODEX_PLAN_LIMIT_MINUTES").and_then(|s| s.parse().ok())
}

/// Whether the controller may create missing dyad pairs (`CODEX_SPAWN_DYADS`).
pub fn spawn_dyads() -> bool {
    bool_var("CODEX_SPAWN_DYADS")
}

/// Whether cooldown transitions auto-create reset tasks
/// (`CODEX_RESET_ON_COOLDOWN`).
pub fn reset_on_cooldown() -> bool {
    bool_var("CODEX_RESET_ON_COOLDOWN")
}

/// Task policy: dyads must exist in the registry.
pub fn require_registered() -> bool {
    bool_var("DYAD_REQUIRE_REGISTERED")
}

/// Task policy: non-todo tasks must carry an assignment.
pub fn require_assignment() -> bool {
    bool_var("DYAD_REQUIRE_ASSIGNMENT")
}

/// Task policy: allow tasks with an empty dyad.
pub fn allow_unassigned() -> bool {
    bool_var("DYAD_ALLOW_UNASSIGNED")
}

/// Task policy: refuse assignment to unavailable dyads.
pub fn enforce_available() -> bool {
    bool_var("DYAD_ENFORCE_AVAILABLE")
}

/// Task policy: per-dyad open-task cap (`DYAD_MAX_OPEN_PER_DYAD`).
pub fn max_open_per_dyad() -> usize {
    var("DYAD_MAX_OPEN_PER_DYAD").and_then(|s| s.parse().ok()).unwrap_or(10)
}

/// Task policy: allow `pool:<name>` placeholder dyads.
pub fn allow_pool() -> bool {
    bool_var("DYAD_ALLOW_POOL")
}

/// Chat bridge endpoint (`TELEGRAM_NOTIFY_URL`).
pub fn notify_url() -> Option<String> {
    var("TELEGRAM_NOTIFY_URL")
}

/// Chat id the bridge posts into (`TELEGRAM_CHAT_ID`).
pub fn notify_chat_id() -> Option<String> {
    var("TELEGRAM_CHAT_ID")
}

/// Digest rebuild interval (`DYAD_TASK_DIGEST_INTERVAL`, default 10 min).
pub fn digest_interval() -> Duration {
    var("DYAD_TASK_DIGEST_INTERVAL")
        .and_then(|s| parse_duration(&s).ok())
        .unwrap_or(Duration::from_secs(600))
}

/// Beam reconcile interval (`BEAM_RECONCILE_INTERVAL`).
pub fn beam_reconcile_interval() -> Option<Duration> {
    var("BEAM_RECONCILE_INTERVAL").and_then(|s| parse_duration(&s).ok())
}

/// Substrate selection (`SX_SUBSTRATE`): `docker` (default) or `k8s`.
pub fn substrate_kind() -> String {
    var("SX_SUBSTRATE").unwrap_or_else(|| "docker".to_string())
}

/// Kubernetes namespace for the k8s substrate.
pub fn k8s_namespace() -> String {
    var("SX_K8S_NAMESPACE").unwrap_or_else(|| "default".to_string())
}

/// Actor image for spawned dyads.
pub fn actor_image() -> String {
    var("SX_ACTOR_IMAGE").unwrap_or_else(|| "silexa/actor:latest".to_string())
}

/// Critic image for spawned dyads.
pub fn critic_image() -> String {
    var("SX_CRITIC_IMAGE").unwrap_or_else(|| "silexa/critic:latest".to_string())
}

/// Host root under which per-dyad workspaces live.
pub fn workspace_root() -> String {
    var("SX_WORKSPACE_ROOT").unwrap_or_else(|| "/srv/silexa/workspaces".to_string())
}

/// Host directory with shared config material.
pub fn configs_dir() -> String {
    var("SX_CONFIGS_DIR").unwrap_or_else(|| "/srv/silexa/configs".to_string())
}

/// Substrate control socket mounted into critics.
pub fn substrate_socket() -> String {
    var("SX_SUBSTRATE_SOCKET").unwrap_or_else(|| "/var/run/docker.sock".to_string())
}

/// Log directory for the file appender (`SX_LOG_DIR`).
pub fn log_dir() -> Option<PathBuf> {
    var("SX_LOG_DIR").map(PathBuf::from)
}

/// External workflow runtime coordinates. Parsed so deployments keep their
/// config surface; the in-process board workflow is the durable owner.
pub fn temporal_coords() -> Option<(String, String, String)> {
    let address = var("TEMPORAL_ADDRESS")?;
    let namespace = var("TEMPORAL_NAMESPACE").unwrap_or_else(|| "default".to_string());
    let task_queue = var("TEMPORAL_TASK_QUEUE").unwrap_or_else(|| "silexa".to_string());
    Some((address, namespace, task_queue))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
