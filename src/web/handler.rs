//! Acceptance endpoint and the public agreement endpoints.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use tracing::{debug, error, info_span, warn, Instrument};
use url::Url;

use super::session;
use super::views::{AgreementView, Templates, ViewKind};
use super::{AppState, PUBLIC_PREFIX};
use crate::models::agreement::Agreement;
use crate::policy::AcceptanceState;

/// Form field carrying one ticked consent id; repeated per checkbox.
const CONSENT_FIELD: &str = "consent";

/// `GET`/`POST` on the entry point.
///
/// `GET` shows the accept prompt to a user with a pending agreement and the
/// read-only page to a user who already accepted. `POST` records acceptance
/// and redirects to the remembered URL or the landing page.
pub async fn terms_of_service(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    jar: CookieJar,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let Some(user) = session::current_user(&headers, &state.config) else {
        warn!("no authenticated user on terms of service request");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let span = info_span!("tos_request", user = %user, method = %method);
    async move {
        let acceptance = match state.policy.state(&user).await {
            Ok(acceptance) => acceptance,
            Err(err) => {
                error!(%err, "failed to evaluate acceptance state");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let (agreement, kind) = match acceptance {
            AcceptanceState::NotRequired => {
                warn!("acceptance of terms of service is not required for this user");
                return StatusCode::NO_CONTENT.into_response();
            }
            AcceptanceState::PendingAcceptance(a) => (a, ViewKind::AcceptTermsOfService),
            AcceptanceState::Accepted(a) => (a, ViewKind::TermsOfService),
        };

        if method == Method::POST {
            let consents = form.map(|Form(pairs)| consent_ids(pairs)).unwrap_or_default();
            do_post(&state, &user, &agreement, &consents, jar).await
        } else {
            render(&state.templates, kind, &agreement, &state.config.entry_point())
        }
    }
    .instrument(span)
    .await
}

async fn do_post(
    state: &AppState,
    user: &str,
    agreement: &Agreement,
    consents: &[String],
    jar: CookieJar,
) -> Response {
    if let Err(err) = state.policy.accept(user, agreement, consents).await {
        error!(%err, agreement = %agreement.id, "failed to record acceptance");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let (jar, remembered) = session::take_remembered_url(jar);
    let next = remembered.map_or_else(
        || state.config.landing_url(),
        |url| format!("{}{url}", state.config.context_path),
    );

    match HeaderValue::from_str(&next) {
        Ok(location) => {
            (StatusCode::SEE_OTHER, jar, [(header::LOCATION, location)]).into_response()
        }
        Err(err) => {
            // Acceptance is already stored; losing the redirect is cosmetic.
            debug!(%err, %next, "failed to redirect after acceptance");
            (StatusCode::OK, jar).into_response()
        }
    }
}

fn consent_ids(pairs: Vec<(String, String)>) -> Vec<String> {
    pairs
        .into_iter()
        .filter(|(name, value)| name == CONSENT_FIELD && !value.is_empty())
        .map(|(_, value)| value)
        .collect()
}

fn render(templates: &Templates, kind: ViewKind, agreement: &Agreement, action: &str) -> Response {
    let page = AgreementView::build(kind, agreement, action)
        .and_then(|view| templates.render(&view));
    match page {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(%err, agreement = %agreement.id, "cannot show agreement");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET {context}/terms-of-service/agreement/{id}`: read-only page for anyone.
pub async fn agreement_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.policy.store().agreement(&id) {
        Some(agreement) => render(&state.templates, ViewKind::TermsOfService, &agreement, ""),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Guest notice as returned to anonymous pages.
#[derive(Debug, Serialize)]
pub struct GuestNoticeResponse {
    /// Notice body.
    pub text: String,
    /// Referenced agreement id.
    pub agreement_id: String,
    /// Public page of the referenced agreement.
    pub agreement_url: String,
}

/// `GET {context}/terms-of-service/guest-notice`.
pub async fn guest_notice(State(state): State<Arc<AppState>>) -> Response {
    let Some(notice) = state.policy.store().guest_notice() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(agreement_url) = agreement_path(&state.config.context_path, &notice.agreement_id)
    else {
        error!(agreement = %notice.agreement_id, "cannot build guest notice agreement URL");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    Json(GuestNoticeResponse {
        text: notice.text,
        agreement_id: notice.agreement_id,
        agreement_url,
    })
    .into_response()
}

/// Public page of agreement `id`, with the id percent-encoded as one path segment.
fn agreement_path(context_path: &str, id: &str) -> Option<String> {
    let base = format!("http://localhost{context_path}{PUBLIC_PREFIX}/agreement");
    let mut url = Url::parse(&base).ok()?;
    url.path_segments_mut().ok()?.push(id);
    Some(url.path().to_owned())
}

/// `GET /health`.
pub async fn health() -> &'static str {
    "ok"
}
