// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown.
//!
//! Startup order matters: the pid lock comes first (prevents races), the
//! state store next (fatal if unreadable), then the board workflow, the
//! projectors, the HTTP surfaces, and last the controller loop. Shutdown
//! cancels the token and lets every loop drain.

use crate::board::{persist, spawn_board, BoardConfig, BoardHandle, SupportedUpdates};
use crate::controller::{Controller, ControllerSettings, EnsureTemplate, HttpManager, ManagerApi};
use crate::listener::{router, ListenCtx};
use crate::notify::{spawn_projector, ChatBridge, HttpBridge};
use crate::policy::PolicyConfig;
use crate::probe::UsageProber;
use crate::status::{status_router, StatusCache};
use crate::{digest, env};
use fs2::FileExt;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use sx_adapters::{DockerSubstrate, K8sSubstrate, Substrate};
use sx_core::SystemClock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that abort startup
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("another sxd holds the lock: {0}")]
    LockFailed(std::io::Error),
    #[error("state store unreadable: {0}")]
    State(#[from] persist::PersistError),
    #[error("bind failed on {0}: {1}")]
    BindFailed(String, std::io::Error),
    #[error("substrate init failed: {0}")]
    Substrate(String),
}

/// A started daemon: cancel to stop.
pub struct Daemon {
    pub cancel: CancellationToken,
    pub board: BoardHandle,
    // Held for the daemon's lifetime; releasing it frees the pid lock.
    _lock_file: std::fs::File,
}

/// Start everything and return the running daemon.
pub async fn start() -> Result<Daemon, LifecycleError> {
    let data_dir = env::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 1. Pid lock first, before any state is touched.
    let lock_path = data_dir.join("sxd.lock");
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 2. State store. Unreadable state is fatal; absent state is first run.
    let state_path = env::state_path();
    let state = persist::load(&state_path)?.unwrap_or_default();
    tracing::info!(
        path = %state_path.display(),
        tasks = state.dyad_tasks.len(),
        dyads = state.dyads.len(),
        "board state loaded"
    );

    if let Some((address, namespace, task_queue)) = env::temporal_coords() {
        tracing::info!(%address, %namespace, %task_queue, "external workflow runtime configured");
    }
    if let Some(interval) = env::beam_reconcile_interval() {
        tracing::info!(?interval, "beam reconcile interval configured");
    }

    let cancel = CancellationToken::new();

    // 3. Board workflow, with the notifier's event stream attached.
    let (task_tx, task_rx) = tokio::sync::mpsc::channel(64);
    let board = spawn_board(
        state,
        BoardConfig {
            policy: PolicyConfig::from_env(),
            state_path: Some(state_path),
            task_events: Some(task_tx),
            supported_updates: SupportedUpdates::all(),
        },
        SystemClock,
    );

    // 4. Chat projectors, when a bridge is configured.
    if let Some(url) = env::notify_url() {
        let chat_id = env::notify_chat_id().unwrap_or_default();
        let bridge: Arc<dyn ChatBridge> = Arc::new(HttpBridge::new(url));
        let _ = spawn_projector(task_rx, Arc::clone(&bridge), board.clone(), chat_id.clone());
        let _ = digest::spawn_ticker(
            bridge,
            board.clone(),
            chat_id,
            env::digest_interval(),
            cancel.clone(),
        );
    } else {
        // Drain the stream so board sends never block.
        tokio::spawn(async move {
            let mut task_rx = task_rx;
            while task_rx.recv().await.is_some() {}
        });
        tracing::info!("no chat bridge configured, notifier and digest disabled");
    }

    // 5. HTTP surfaces.
    let ctx = Arc::new(ListenCtx { board: board.clone(), start_time: Instant::now() });
    serve(env::addr(), router(ctx), cancel.clone()).await?;

    let cache = StatusCache::new();
    serve(env::monitor_addr(), status_router(cache.clone()), cancel.clone()).await?;

    // 6. Substrate and the controller loop.
    let substrate: Arc<dyn Substrate> = match env::substrate_kind().as_str() {
        "k8s" => Arc::new(
            K8sSubstrate::new(env::k8s_namespace())
                .await
                .map_err(|e| LifecycleError::Substrate(e.to_string()))?,
        ),
        _ => Arc::new(DockerSubstrate::new()),
    };

    if let Some(accounts_file) = env::accounts_file() {
        let manager: Arc<dyn ManagerApi> = match env::manager_url() {
            Some(url) => Arc::new(HttpManager::new(url)),
            None => Arc::new(board.clone()),
        };
        let prober = Arc::new(UsageProber::new(
            Arc::clone(&substrate),
            data_dir.join("shadow"),
        ));
        let settings = ControllerSettings {
            require_registered: env::require_registered(),
            reset_on_cooldown: env::reset_on_cooldown(),
            spawn_dyads: env::spawn_dyads(),
            poll_interval_override: env::status_poll_interval(),
            threshold_override: env::cooldown_threshold_pct(),
            plan_limit_override: env::plan_limit_minutes(),
            scrape_enrich: true,
            ensure: EnsureTemplate {
                actor_image: env::actor_image(),
                critic_image: env::critic_image(),
                workspace_root: env::workspace_root(),
                configs_dir: env::configs_dir(),
                substrate_socket: env::substrate_socket(),
            },
            ..ControllerSettings::new(accounts_file)
        };
        let controller =
            Controller::new(substrate, prober, manager, cache, settings, SystemClock);
        tokio::spawn(controller.run(cancel.clone()));
    } else {
        tracing::info!("CODEX_ACCOUNTS_FILE unset, controller disabled");
    }

    Ok(Daemon { cancel, board, _lock_file: lock_file })
}

/// Bind an address and serve a router until cancelled.
async fn serve(
    addr: String,
    app: axum::Router,
    cancel: CancellationToken,
) -> Result<(), LifecycleError> {
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(addr.clone(), e))?;
    tracing::info!(%addr, "listening");
    tokio::spawn(async move {
        let shutdown = async move { cancel.cancelled().await };
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
            tracing::error!(error = %e, "http server exited");
        }
    });
    Ok(())
}
