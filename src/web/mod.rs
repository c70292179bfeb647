//! HTTP surface: the acceptance endpoint, public agreement pages, and the
//! acceptance gate.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::config::GlobalConfig;
use crate::policy::AcceptancePolicy;
use views::Templates;

pub mod gate;
pub mod handler;
pub mod server;
pub mod session;
pub mod views;

/// Prefix, under the context path, of the endpoints open to guests.
pub const PUBLIC_PREFIX: &str = "/terms-of-service";

/// Liveness probe path.
pub const HEALTH_PATH: &str = "/health";

/// Shared state for every handler.
pub struct AppState {
    /// Service configuration.
    pub config: Arc<GlobalConfig>,
    /// Acceptance decisions over the live agreement store.
    pub policy: AcceptancePolicy,
    /// Compiled agreement page templates.
    pub templates: Templates,
}

/// Routes owned by this service, without the gate.
pub fn routes(state: Arc<AppState>) -> Router {
    let context = state.config.context_path.clone();
    Router::new()
        .route(
            &state.config.entry_point(),
            get(handler::terms_of_service).post(handler::terms_of_service),
        )
        .route(
            &format!("{context}{PUBLIC_PREFIX}/agreement/{{id}}"),
            get(handler::agreement_page),
        )
        .route(
            &format!("{context}{PUBLIC_PREFIX}/guest-notice"),
            get(handler::guest_notice),
        )
        .route(HEALTH_PATH, get(handler::health))
        .with_state(state)
}

/// Put `host` behind the acceptance gate and merge in this service's routes.
///
/// Requests that match no route fall through to `host`'s fallback, so the
/// gate also covers pages served by the host.
pub fn gated(host: Router, state: Arc<AppState>) -> Router {
    routes(Arc::clone(&state))
        .merge(host)
        .layer(middleware::from_fn_with_state(state, gate::require_acceptance))
}

/// Stand-alone router: this service's routes plus a gated 404 fallback.
pub fn router(state: Arc<AppState>) -> Router {
    gated(Router::new().fallback(not_found), state)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
