//! HTTP listener lifecycle.

use std::net::SocketAddr;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::GlobalConfig;
use crate::{AppError, Result};

/// Serve `router` on the configured address until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the listener cannot bind or the server fails.
pub async fn serve(config: &GlobalConfig, router: Router, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from((config.bind_address, config.http_port));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind on {bind}: {err}")))?;

    info!(%bind, entry_point = %config.entry_point(), "starting terms of service HTTP server");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Http(format!("server error: {err}")))?;

    info!("terms of service HTTP server shut down");
    Ok(())
}
