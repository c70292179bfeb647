//! Integration tests for the guest-facing endpoints.

use axum::http::{header, StatusCode};

use super::test_helpers::{body_string, get, TestEnv, FORCED_TOS, TOS_TEXT};

#[tokio::test]
async fn agreement_page_is_public_and_read_only() {
    let env = TestEnv::with_agreements(FORCED_TOS).await;

    let response = env.send(get("/terms-of-service/agreement/tos", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("<h1>Site Terms</h1>"));
    assert!(body.contains(TOS_TEXT));
    assert!(!body.contains("<form"));
}

#[tokio::test]
async fn unknown_agreement_is_not_found() {
    let env = TestEnv::with_agreements(FORCED_TOS).await;

    let response = env.send(get("/terms-of-service/agreement/nope", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn link_only_agreement_page_shows_link() {
    let env = TestEnv::with_agreements(
        r#"<terms-of-service>
            <agreement id="ext">
                <parameters>
                    <param name="agreement-link" value="https://example.com/terms"/>
                    <param name="short-name" value="Terms"/>
                </parameters>
            </agreement>
        </terms-of-service>"#,
    )
    .await;

    let body = body_string(env.send(get("/terms-of-service/agreement/ext", None)).await).await;

    assert!(body.contains("href=\"https:&#x2F;&#x2F;example.com&#x2F;terms\""));
    assert!(body.contains("<title>Terms of Service</title>"));
}

#[tokio::test]
async fn guest_notice_is_served_as_json() {
    let env = TestEnv::with_agreements_and_config(FORCED_TOS, "context_path = '/app'").await;

    let response = env.send(get("/app/terms-of-service/guest-notice", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).expect("content type"),
        "application/json"
    );
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response).await).expect("json body");
    assert_eq!(json["text"], "By browsing you agree to the terms");
    assert_eq!(json["agreement_id"], "tos");
    assert_eq!(json["agreement_url"], "/app/terms-of-service/agreement/tos");
}

#[tokio::test]
async fn guest_notice_absent_is_not_found() {
    let env = TestEnv::empty().await;

    let response = env.send(get("/terms-of-service/guest-notice", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_ok() {
    let env = TestEnv::empty().await;

    let response = env.send(get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}
