#![forbid(unsafe_code)]

//! `terms-of-service` is the agreement acceptance server binary.
//!
//! Loads the service configuration, starts the agreement config watcher,
//! opens the acceptance database, and serves the HTTP endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use terms_of_service::config::GlobalConfig;
use terms_of_service::persistence::acceptance_repo::AcceptanceRepo;
use terms_of_service::persistence::db;
use terms_of_service::policy::AcceptancePolicy;
use terms_of_service::store::watcher::AgreementWatcher;
use terms_of_service::store::AgreementStore;
use terms_of_service::web::views::Templates;
use terms_of_service::web::{self, server, AppState};
use terms_of_service::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "terms-of-service",
    about = "Terms of service acceptance server",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the product configuration directory.
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("terms-of-service server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(dir) = args.config_dir {
        config.set_config_dir(&dir)?;
    }
    let config = Arc::new(config);
    info!(config_dir = %config.config_dir.display(), "configuration loaded");

    // ── Agreement store and watcher ─────────────────────
    let watcher = AgreementWatcher::start(
        Arc::new(AgreementStore::from_config(&config)),
        config.watch_interval(),
    )?;
    let store = Arc::clone(watcher.store());

    // ── Acceptance database ─────────────────────────────
    let database = Arc::new(db::connect(&config.db_path()).await?);
    info!(path = %config.db_path().display(), "acceptance database connected");

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        policy: AcceptancePolicy::new(store, AcceptanceRepo::new(database)),
        templates: Templates::new()?,
    });

    // ── Serve ───────────────────────────────────────────
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    let router = web::router(state);
    let server_config = Arc::clone(&config);
    let mut server_handle =
        tokio::spawn(async move { server::serve(&server_config, router, server_ct).await });

    let outcome = tokio::select! {
        joined = &mut server_handle => joined,
        () = shutdown_signal() => {
            info!("shutdown signal received");
            ct.cancel();
            server_handle.await
        }
    };
    drop(watcher);

    match outcome {
        Ok(Ok(())) => {
            info!("terms-of-service shut down");
            Ok(())
        }
        Ok(Err(err)) => {
            error!(%err, "http server failed");
            Err(err)
        }
        Err(err) => Err(AppError::Http(format!("http server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
