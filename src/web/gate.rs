//! Acceptance gate middleware.
//!
//! Sends authenticated users with a pending forced agreement to the entry
//! point before they reach any other page, remembering where they were
//! going so the accept `POST` can send them back.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use tracing::{debug, error, warn};

use super::{session, AppState, HEALTH_PATH, PUBLIC_PREFIX};
use crate::config::GlobalConfig;

/// Paths the gate never intercepts.
fn is_exempt(path: &str, config: &GlobalConfig) -> bool {
    if path == HEALTH_PATH || path == config.entry_point() {
        return true;
    }
    let public = format!("{}{PUBLIC_PREFIX}", config.context_path);
    path == public || path.starts_with(&format!("{public}/"))
}

/// Path and query of the request relative to the context path.
fn relative_target(request: &Request, config: &GlobalConfig) -> String {
    let uri = request.uri();
    let path = uri
        .path()
        .strip_prefix(config.context_path.as_str())
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(uri.path());
    match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_owned(),
    }
}

/// Middleware entry point; install with `middleware::from_fn_with_state`.
pub async fn require_acceptance(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config;
    if is_exempt(request.uri().path(), config) {
        return next.run(request).await;
    }
    let Some(user) = session::current_user(request.headers(), config) else {
        return next.run(request).await;
    };

    match state.policy.state(&user).await {
        Ok(acceptance) if acceptance.is_pending() => {}
        Ok(_) => return next.run(request).await,
        Err(err) => {
            error!(%err, %user, "failed to evaluate acceptance state");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    if request.method() != Method::GET && request.method() != Method::HEAD {
        warn!(
            %user,
            path = %request.uri().path(),
            "blocked request from user with pending agreement"
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    let target = relative_target(&request, config);
    debug!(%user, %target, "redirecting to terms of service");
    let jar = session::remember_url(jar, &target);
    match HeaderValue::from_str(&config.entry_point()) {
        Ok(location) => {
            (StatusCode::SEE_OTHER, jar, [(header::LOCATION, location)]).into_response()
        }
        Err(err) => {
            error!(%err, "entry point is not a valid redirect target");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
