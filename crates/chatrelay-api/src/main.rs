//! chatrelay entry point.
//!
//! Binary name: `chatrelay`
//!
//! Parses CLI arguments, initializes tracing, then either starts the HTTP
//! server or bootstraps the store schema.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use chatrelay_api::cli::{Cli, Commands, ServeArgs, StoreArgs};
use chatrelay_api::http::router::build_router;
use chatrelay_api::state::{AppState, StoreSettings};
use chatrelay_core::chat::session::spawn_idle_sweeper;
use chatrelay_core::repository::exchange::ExchangeRepository;
use chatrelay_infra::config::load_service_config;
use chatrelay_infra::store::exchange::SqlExchangeRepository;
use chatrelay_infra::store::pool::StorePool;
use chatrelay_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};
use chatrelay_types::config::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet),
        format: cli.log_format.into(),
        enable_otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::InitDb(store) => init_db(store).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "Exiting with error");
    }
    shutdown_tracing();
    result
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_service_config(args.config.as_deref()).await;
    args.apply_overrides(&mut config);
    config.validate()?;

    let state = AppState::init(&args, &config).await?;

    let cancel = CancellationToken::new();
    let sweeper = config.session_idle_secs.map(|secs| {
        spawn_idle_sweeper(
            state.chat_service.sessions().clone(),
            Duration::from_secs(secs),
            cancel.clone(),
        )
    });

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;
    tracing::info!(address = %listener.local_addr()?, "chatrelay listening");

    let router = build_router(state.clone(), &args.web_dir);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    if let Some(handle) = sweeper {
        join_background("session sweeper", handle).await;
    }
    state.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn init_db(store: StoreArgs) -> anyhow::Result<()> {
    let settings = StoreSettings::resolve(&store, &ServiceConfig::default());
    let pool = StorePool::prepare(&settings.target, &settings.pool)
        .await
        .context("invalid store settings")?;

    let repo = SqlExchangeRepository::new(pool.clone());
    let result = repo.ensure_schema().await;
    pool.close().await;
    result.with_context(|| format!("failed to prepare {}", settings.target.describe()))?;

    tracing::info!(store = %settings.target.describe(), "chats table ready");
    Ok(())
}

/// Await a background task after cancellation. Returns `false` when the task
/// panicked or was aborted.
async fn join_background(name: &str, handle: tokio::task::JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(task = name, error = %e, "Background task did not finish cleanly");
            false
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
