// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sxd — the Silexa manager daemon.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match sx_daemon::env::log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "sxd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let _guard = init_tracing();

    let daemon = match sx_daemon::lifecycle::start().await {
        Ok(daemon) => daemon,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return std::process::ExitCode::FAILURE;
        }
    };

    tracing::info!("sxd started");

    // SIGINT / SIGTERM drain everything through the cancel token.
    let cancel = daemon.cancel.clone();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
        }
        _ = terminate_signal() => {
            tracing::info!("terminate received, shutting down");
        }
    }
    cancel.cancel();

    // Give loops a moment to drain before the process exits.
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    std::process::ExitCode::SUCCESS
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(_) => std::future::pending::<()>().await,
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await
}
