//! Shared test helpers for HTTP-level integration tests.
//!
//! Provides a temporary product config directory, an in-memory acceptance
//! database, and request builders so individual test modules can focus on
//! behaviour rather than boilerplate.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use terms_of_service::config::GlobalConfig;
use terms_of_service::persistence::{acceptance_repo::AcceptanceRepo, db};
use terms_of_service::policy::AcceptancePolicy;
use terms_of_service::store::AgreementStore;
use terms_of_service::web::views::Templates;
use terms_of_service::web::{self, AppState};

/// Header the test config reads the user name from.
pub const USER_HEADER: &str = "x-remote-user";

/// One forced agreement backed by `tos.html`, with two consents.
pub const FORCED_TOS: &str = r#"<terms-of-service>
    <agreement id="tos">
        <parameters>
            <param name="agreement-file" value="tos.html"/>
            <param name="full-name" value="Site Terms"/>
            <param name="version" value="1"/>
        </parameters>
        <consents>
            <consent id="marketing" text="Email me about offers" checked="true"/>
            <consent id="analytics" text="Collect usage statistics"/>
        </consents>
    </agreement>
    <guest-notice>
        <parameters>
            <param name="text" value="By browsing you agree to the terms"/>
            <param name="agreement" value="tos"/>
        </parameters>
    </guest-notice>
</terms-of-service>"#;

/// Text of `tos.html` written by [`TestEnv::with_agreements`].
pub const TOS_TEXT: &str = "<p>Be nice to each other.</p>";

/// Isolated service instance over a temporary config directory.
pub struct TestEnv {
    /// Kept alive for the duration of the test.
    pub dir: TempDir,
    pub config: Arc<GlobalConfig>,
    pub store: Arc<AgreementStore>,
    pub repo: AcceptanceRepo,
    pub state: Arc<AppState>,
}

impl TestEnv {
    /// Service with no agreement config file at all.
    pub async fn empty() -> Self {
        Self::build("").await
    }

    /// Service with `xml` as the agreement config and `tos.html` present.
    pub async fn with_agreements(xml: &str) -> Self {
        Self::with_agreements_and_config(xml, "").await
    }

    /// Same as [`Self::with_agreements`] with extra TOML settings.
    pub async fn with_agreements_and_config(xml: &str, extra_toml: &str) -> Self {
        let env = Self::build(extra_toml).await;
        env.write_store_file("tos.html", TOS_TEXT);
        env.write_agreements(xml);
        env
    }

    async fn build(extra_toml: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let toml = format!(
            "config_dir = '{root}'\nhttp_port = 0\n{extra_toml}\n",
            root = dir.path().display().to_string().replace('\\', "\\\\"),
        );
        let config = Arc::new(GlobalConfig::from_toml_str(&toml).expect("valid test config"));
        fs::create_dir_all(config.store_dir()).expect("create store dir");

        let store = Arc::new(AgreementStore::from_config(&config));
        store.reload();
        let database = Arc::new(db::connect_memory().await.expect("db connect"));
        let repo = AcceptanceRepo::new(database);
        let state = Arc::new(AppState {
            config: Arc::clone(&config),
            policy: AcceptancePolicy::new(Arc::clone(&store), repo.clone()),
            templates: Templates::new().expect("templates compile"),
        });

        Self {
            dir,
            config,
            store,
            repo,
            state,
        }
    }

    /// Path of `name` inside the store directory.
    pub fn store_path(&self, name: &str) -> PathBuf {
        self.config.store_dir().join(name)
    }

    /// Write a file into the store directory without reloading.
    pub fn write_store_file(&self, name: &str, contents: &str) {
        fs::write(self.store_path(name), contents).expect("write store file");
    }

    /// Replace the agreement config and reload the store.
    pub fn write_agreements(&self, xml: &str) {
        fs::write(self.config.agreements_file(), xml).expect("write agreements");
        self.store.reload();
    }

    /// Fresh router over this environment's state.
    pub fn router(&self) -> Router {
        web::router(Arc::clone(&self.state))
    }

    /// Send one request through a fresh router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.expect("infallible router")
    }
}

/// `GET uri`, optionally as `user`.
pub fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, user)
        .body(Body::empty())
        .expect("valid request")
}

/// Form `POST uri` as `user` with an optional raw `Cookie` header.
pub fn post_form(uri: &str, user: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = request(Method::POST, uri, Some(user))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_owned())).expect("valid request")
}

fn request(method: Method, uri: &str, user: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match user {
        Some(user) => builder.header(USER_HEADER, user),
        None => builder,
    }
}

/// Collect a response body as UTF-8.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// `Location` header of a redirect.
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
}

/// All `Set-Cookie` headers joined for substring checks.
pub fn set_cookies(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("\n")
}
