//! Request identity and the remembered-URL cookie.
//!
//! User management lives in the host: the authenticated user name arrives
//! in a trusted header (`user_header` in the service config). The only
//! session state kept here is the page a user was heading to when the
//! acceptance gate intercepted them.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use crate::config::GlobalConfig;

/// Cookie holding the remembered URL, relative to the context path.
pub const REMEMBER_URL_COOKIE: &str = "TOS_REMEMBER_URL";

/// Authenticated user name from the configured header.
///
/// Returns `None` when the header is absent, empty, or not valid UTF-8.
#[must_use]
pub fn current_user(headers: &HeaderMap, config: &GlobalConfig) -> Option<String> {
    headers
        .get(config.user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Whether `url` may be stored and later redirected to.
///
/// Only same-site relative paths made of cookie-safe characters qualify.
#[must_use]
pub fn is_rememberable(url: &str) -> bool {
    url.starts_with('/')
        && !url.starts_with("//")
        && url
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\'))
}

/// Store `url` for a later [`take_remembered_url`]; unsafe values are dropped.
#[must_use]
pub fn remember_url(jar: CookieJar, url: &str) -> CookieJar {
    if !is_rememberable(url) {
        return jar;
    }
    jar.add(
        Cookie::build((REMEMBER_URL_COOKIE, url.to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read and forget the remembered URL.
#[must_use]
pub fn take_remembered_url(jar: CookieJar) -> (CookieJar, Option<String>) {
    let Some(raw) = jar.get(REMEMBER_URL_COOKIE).map(|c| c.value().to_owned()) else {
        return (jar, None);
    };
    let jar = jar.remove(Cookie::build((REMEMBER_URL_COOKIE, "")).path("/"));
    (jar, Some(raw).filter(|url| is_rememberable(url)))
}
