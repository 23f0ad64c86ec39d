use http::StatusCode;
use http::header::SET_COOKIE;

use crate::common::{MockBrowser, TestApp, body_text};
use formguard::{CSRF_COOKIE_NAME, CSRF_HEADER_NAME};

#[tokio::test]
async fn test_get_never_needs_a_token() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("token="));
}

#[tokio::test]
async fn test_post_without_token_is_rejected_without_side_effects() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.get("/").await;

    let response = browser.post_form("/submit", &[("title", "x")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(app.counters.hits(), 0);
}

#[tokio::test]
async fn test_post_without_any_session_is_rejected() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.post_form("/submit", &[("csrf_token", "guess")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(app.counters.hits(), 0);
}

#[tokio::test]
async fn test_post_with_form_token_is_accepted() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    let token = browser.csrf_token().await;

    let response = browser
        .post_form("/submit", &[("csrf_token", token.as_str())])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "submitted");
    assert_eq!(app.counters.hits(), 1);
}

#[tokio::test]
async fn test_large_form_with_valid_token_reaches_handler() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    let token = browser.csrf_token().await;
    let content = "a".repeat(70_000);

    let response = browser
        .post_form(
            "/submit",
            &[("content", content.as_str()), ("csrf_token", token.as_str())],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.counters.hits(), 1);
}

#[tokio::test]
async fn test_post_with_header_token_is_accepted() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    let token = browser.csrf_token().await;

    let response = browser
        .post_with_header("/submit", CSRF_HEADER_NAME.as_str(), &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.counters.hits(), 1);
}

#[tokio::test]
async fn test_token_from_another_session_is_rejected() {
    let (app, _) = TestApp::start().await;
    let mut victim = MockBrowser::new(app.router.clone());
    let mut attacker = MockBrowser::new(app.router);
    victim.get("/").await;
    let attacker_token = attacker.csrf_token().await;

    let response = victim
        .post_form("/submit", &[("csrf_token", attacker_token.as_str())])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.counters.hits(), 0);
}

#[tokio::test]
async fn test_missing_double_submit_cookie_is_rejected() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    let token = browser.csrf_token().await;
    browser.remove_cookie(CSRF_COOKIE_NAME.as_str());

    let response = browser
        .post_form("/submit", &[("csrf_token", token.as_str())])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.counters.hits(), 0);
}

#[tokio::test]
async fn test_tampered_double_submit_cookie_is_rejected() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    let token = browser.csrf_token().await;
    browser.set_cookie(
        CSRF_COOKIE_NAME.as_str(),
        "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
    );

    let response = browser
        .post_form("/submit", &[("csrf_token", token.as_str())])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lost_csrf_cookie_is_reissued_on_get() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.get("/").await;
    let secret = browser
        .cookie(CSRF_COOKIE_NAME.as_str())
        .map(str::to_string);
    browser.remove_cookie(CSRF_COOKIE_NAME.as_str());

    browser.get("/").await;

    assert_eq!(
        browser.cookie(CSRF_COOKIE_NAME.as_str()).map(str::to_string),
        secret
    );
}

#[tokio::test]
async fn test_protected_post_checks_csrf_before_authentication() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.get("/").await;

    // Anonymous and without a token: the CSRF guard answers first
    let response = browser.post_form("/account/update", &[]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
