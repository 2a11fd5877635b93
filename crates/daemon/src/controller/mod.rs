// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dyad lifecycle controller.
//!
//! One poll cycle per interval: reload config, fetch the registry once,
//! then for each enabled account ensure the container pair, probe usage
//! for both members, refresh the status cache, emit metrics for the
//! monitored member, and raise cooldown work. The loop is the retry:
//! every failure is logged, noted in the cache, and revisited next tick.

pub mod manager;

pub use manager::{HttpManager, ManagerApi, ManagerError};

use crate::config::AccountsConfig;
use crate::probe::Prober;
use crate::status::StatusCache;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sx_adapters::{EnsureOptions, Substrate};
use sx_core::{
    AccountDescriptor, Clock, DyadTask, Feedback, Member, Metric, Severity, TaskPriority,
    UsageSnapshot,
};
use tokio_util::sync::CancellationToken;

/// Kind of the auto-created account reset task.
pub const RESET_TASK_KIND: &str = "beam.codex_account_reset";

/// Per-account deadline inside one poll cycle.
const ACCOUNT_DEADLINE: Duration = Duration::from_secs(30);

/// Static inputs for building ensure options per dyad.
#[derive(Debug, Clone, Default)]
pub struct EnsureTemplate {
    pub actor_image: String,
    pub critic_image: String,
    pub workspace_root: String,
    pub configs_dir: String,
    pub substrate_socket: String,
}

impl EnsureTemplate {
    fn options_for(&self, dyad: &str) -> EnsureOptions {
        EnsureOptions {
            dyad: dyad.to_string(),
            actor_image: self.actor_image.clone(),
            critic_image: self.critic_image.clone(),
            workspace_dir: format!("{}/{}", self.workspace_root.trim_end_matches('/'), dyad),
            configs_dir: self.configs_dir.clone(),
            substrate_socket: self.substrate_socket.clone(),
        }
    }
}

/// Controller behavior switches, frozen at startup.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub accounts_file: PathBuf,
    pub require_registered: bool,
    pub reset_on_cooldown: bool,
    pub spawn_dyads: bool,
    /// Env override for the poll interval; the config file wins otherwise.
    pub poll_interval_override: Option<Duration>,
    /// Env override for the cooldown threshold.
    pub threshold_override: Option<f64>,
    /// Env override for the plan limit in minutes.
    pub plan_limit_override: Option<u64>,
    /// Run a terminal scrape when the probe leaves model/effort/session
    /// unknown. Off in tests.
    pub scrape_enrich: bool,
    pub ensure: EnsureTemplate,
}

impl ControllerSettings {
    pub fn new(accounts_file: PathBuf) -> Self {
        Self {
            accounts_file,
            require_registered: false,
            reset_on_cooldown: false,
            spawn_dyads: false,
            poll_interval_override: None,
            threshold_override: None,
            plan_limit_override: None,
            scrape_enrich: false,
            ensure: EnsureTemplate::default(),
        }
    }
}

/// The controller loop state.
pub struct Controller<C: Clock> {
    substrate: Arc<dyn Substrate>,
    prober: Arc<dyn Prober>,
    manager: Arc<dyn ManagerApi>,
    cache: StatusCache,
    settings: ControllerSettings,
    clock: C,
    /// Last observed cooldown flag per account name (edge detection).
    prev_cooldown: HashMap<String, bool>,
}

impl<C: Clock> Controller<C> {
    pub fn new(
        substrate: Arc<dyn Substrate>,
        prober: Arc<dyn Prober>,
        manager: Arc<dyn ManagerApi>,
        cache: StatusCache,
        settings: ControllerSettings,
        clock: C,
    ) -> Self {
        Self { substrate, prober, manager, cache, settings, clock, prev_cooldown: HashMap::new() }
    }

    /// Run until cancelled. The interval follows the config file and is
    /// re-read every cycle.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let config = self.load_config();
            self.poll_once(&config).await;
            let interval = self
                .settings
                .poll_interval_override
                .unwrap_or_else(|| config.poll_interval());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    fn load_config(&self) -> AccountsConfig {
        match AccountsConfig::load(&self.settings.accounts_file) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "accounts config unreadable, using empty");
                AccountsConfig::default()
            }
        }
    }

    fn threshold(&self, config: &AccountsConfig) -> f64 {
        self.settings.threshold_override.unwrap_or_else(|| config.cooldown_threshold())
    }

    fn plan_limit(&self, config: &AccountsConfig) -> u64 {
        self.settings.plan_limit_override.unwrap_or(config.total_limit_minutes)
    }

    /// One poll cycle over every enabled account.
    pub async fn poll_once(&mut self, config: &AccountsConfig) {
        let now_ms = self.clock.epoch_ms();

        // Fetch the registry once per cycle.
        let registry: Option<HashSet<String>> = if self.settings.require_registered {
            match self.manager.registered_dyads().await {
                Ok(dyads) => Some(dyads.into_iter().map(|d| d.dyad).collect()),
                Err(e) => {
                    tracing::warn!(error = %e, "dyad registry fetch failed");
                    for account in config.accounts.iter().filter(|a| a.enabled) {
                        if !account.dyad.is_empty() {
                            self.cache.mark_dyad(
                                &account.dyad,
                                "dyad registry unavailable",
                                now_ms,
                            );
                        }
                    }
                    return;
                }
            }
        } else {
            None
        };

        for account in config.accounts.iter().filter(|a| a.enabled) {
            if account.dyad.is_empty() {
                continue;
            }
            if let Some(registry) = &registry {
                if !registry.contains(&account.dyad) {
                    self.cache.mark_dyad(&account.dyad, "dyad not registered", now_ms);
                    continue;
                }
            }

            let deadline = tokio::time::timeout(
                ACCOUNT_DEADLINE,
                self.poll_account(account, config),
            );
            if deadline.await.is_err() {
                tracing::warn!(dyad = %account.dyad, "account poll hit the 30s deadline");
                self.cache.mark_dyad(&account.dyad, "timeout", self.clock.epoch_ms());
            }
        }
    }

    /// Ensure the pair exists and poll usage for every member.
    async fn poll_account(&mut self, account: &AccountDescriptor, config: &AccountsConfig) {
        let dyad = &account.dyad;
        let now_ms = self.clock.epoch_ms();

        match self.substrate.dyad_ready(dyad).await {
            Ok((exists, ready)) => {
                if !exists {
                    if self.settings.spawn_dyads && account.spawn {
                        let opts = self.settings.ensure.options_for(dyad);
                        if let Err(e) = self.substrate.ensure_dyad(&opts).await {
                            tracing::warn!(%dyad, error = %e, "ensure failed");
                            self.cache.mark_dyad(dyad, &e.to_string(), now_ms);
                        }
                    } else {
                        self.cache.mark_dyad(
                            dyad,
                            &format!("missing {} container", dyad),
                            now_ms,
                        );
                    }
                } else if !ready {
                    if let Err(e) = self.substrate.restart_dyad(dyad).await {
                        tracing::warn!(%dyad, error = %e, "restart failed");
                        self.cache.mark_dyad(dyad, &e.to_string(), now_ms);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%dyad, error = %e, "inspect failed");
                self.cache.mark_dyad(dyad, &e.to_string(), now_ms);
            }
        }

        for member in Member::ALL {
            self.poll_member(account, member, config).await;
        }
    }

    async fn poll_member(
        &mut self,
        account: &AccountDescriptor,
        member: Member,
        config: &AccountsConfig,
    ) {
        let dyad = &account.dyad;
        let now_ms = self.clock.epoch_ms();
        let monitored = account.monitor.member() == member;

        match self.prober.probe(account, member).await {
            Ok(mut snapshot) => {
                let plan_limit = self.plan_limit(config);
                self.enrich_via_scrape(account, member, &mut snapshot, plan_limit).await;
                self.cache.set_snapshot(dyad, member, snapshot.clone(), "", now_ms);
                if monitored {
                    let threshold = self.threshold(config);
                    self.emit_metrics(account, &snapshot, threshold).await;
                    self.detect_cooldown_edge(account, &snapshot, threshold).await;
                }
            }
            Err(e) => {
                // Usage probe failed for a reachable member: no metric at
                // all, just the note.
                let note = e.status_note();
                tracing::warn!(%dyad, %member, error = %e, "usage probe failed");
                self.cache.set_note(dyad, member, &note, now_ms);
                if matches!(e, crate::probe::ProbeError::Auth(_)) {
                    let _ = self
                        .manager
                        .add_feedback(Feedback {
                            dyad: dyad.clone(),
                            severity: Severity::Warn,
                            message: format!("{}/{}: {}", dyad, member, note),
                            ..Feedback::default()
                        })
                        .await;
                }
            }
        }
    }

    /// One scrape fills in model, effort, and session when the RPC probe
    /// could not.
    async fn enrich_via_scrape(
        &self,
        account: &AccountDescriptor,
        member: Member,
        snapshot: &mut UsageSnapshot,
        plan_limit_minutes: u64,
    ) {
        if !self.settings.scrape_enrich {
            return;
        }
        let complete = !snapshot.model.is_empty()
            && !snapshot.reasoning_effort.is_empty()
            && !snapshot.session_id.is_empty();
        if complete {
            return;
        }
        let container = match self.substrate.resolve_member(&account.dyad, member).await {
            Ok(container) => container,
            Err(e) => {
                tracing::debug!(dyad = %account.dyad, %member, error = %e, "no container to scrape");
                return;
            }
        };
        let argv = self
            .substrate
            .interactive_exec_argv(&container, &["codex".to_string()]);
        match crate::scrape::scrape_command(&argv).await {
            Ok(bytes) => {
                let scraped =
                    crate::probe::parse::parse_usage_text(&bytes, plan_limit_minutes);
                snapshot.enrich_from(&scraped);
            }
            Err(e) => {
                tracing::debug!(dyad = %account.dyad, %member, error = %e, "scrape enrichment failed");
            }
        }
    }

    async fn emit_metrics(
        &self,
        account: &AccountDescriptor,
        snapshot: &UsageSnapshot,
        threshold: f64,
    ) {
        let labels = || {
            let mut map = std::collections::BTreeMap::new();
            map.insert("account".to_string(), account.name.clone());
            map.insert("member".to_string(), account.monitor.to_string());
            map
        };
        let metrics = [
            ("codex.remaining_pct", snapshot.short.remaining_pct),
            ("codex.remaining_minutes", snapshot.short.remaining_minutes as f64),
            ("codex.weekly_remaining_pct", snapshot.weekly.remaining_pct),
            ("codex.cooldown", if snapshot.cooldown(threshold) { 1.0 } else { 0.0 }),
        ];
        for (name, value) in metrics {
            let metric = Metric {
                name: name.to_string(),
                value,
                dyad: account.dyad.clone(),
                labels: labels(),
                ..Metric::default()
            };
            if let Err(e) = self.manager.add_metric(metric).await {
                tracing::warn!(dyad = %account.dyad, error = %e, "metric emit failed");
            }
        }
    }

    /// Healthy→cooldown transitions raise feedback and (optionally) an
    /// account-reset task, de-duplicated against open tasks of the same
    /// kind for the dyad.
    async fn detect_cooldown_edge(
        &mut self,
        account: &AccountDescriptor,
        snapshot: &UsageSnapshot,
        threshold: f64,
    ) {
        let current = snapshot.cooldown(threshold);
        let prev = self
            .prev_cooldown
            .insert(account.name.clone(), current)
            .unwrap_or(false);
        if prev == current || !current {
            return;
        }

        let message = format!(
            "{}: cooldown entered ({} remaining)",
            account.dyad,
            sx_core::usage::format_pct(snapshot.short.remaining_pct),
        );
        if let Err(e) = self
            .manager
            .add_feedback(Feedback {
                dyad: account.dyad.clone(),
                severity: Severity::Warn,
                message,
                ..Feedback::default()
            })
            .await
        {
            tracing::warn!(dyad = %account.dyad, error = %e, "cooldown feedback failed");
        }

        if !self.settings.reset_on_cooldown {
            return;
        }
        match self.manager.dyad_tasks().await {
            Ok(tasks) => {
                let already_open = tasks.iter().any(|t| {
                    t.dyad == account.dyad && t.kind == RESET_TASK_KIND && t.is_open()
                });
                if already_open {
                    tracing::info!(dyad = %account.dyad, "reset task already open, skipping");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(dyad = %account.dyad, error = %e, "reset de-dup scan failed");
                return;
            }
        }

        let task = DyadTask {
            title: format!("Reset codex account for {}", account.dyad),
            kind: RESET_TASK_KIND.to_string(),
            priority: TaskPriority::High,
            dyad: account.dyad.clone(),
            requested_by: "beam.monitor".to_string(),
            notes: format!("[{}.targets]=actor,critic", RESET_TASK_KIND),
            ..DyadTask::default()
        };
        if let Err(e) = self.manager.add_dyad_task(task).await {
            tracing::warn!(dyad = %account.dyad, error = %e, "reset task create failed");
        } else {
            tracing::info!(dyad = %account.dyad, "created account reset task");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
