use http::StatusCode;
use http::header::{CACHE_CONTROL, LOCATION};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::common::{CountingUsers, FailingUsers, MockBrowser, TestApp, body_text};
use formguard::SESSION_COOKIE_NAME;

#[tokio::test]
async fn test_anonymous_request_is_redirected_to_login() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.get("/account").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/user/login");
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
    assert_eq!(app.counters.hits(), 0);
}

#[tokio::test]
async fn test_login_grants_access_to_protected_routes() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.login_as(1).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/account");

    let response = browser.get("/account").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
    assert_eq!(body_text(response).await, "user=1");
    assert_eq!(app.counters.hits(), 1);
}

#[tokio::test]
async fn test_public_pages_are_not_marked_no_store() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.login_as(1).await;

    let response = browser.get("/").await;

    assert!(response.headers().get(CACHE_CONTROL).is_none());
    assert_eq!(body_text(response).await.split(' ').next(), Some("authenticated=true"));
}

#[tokio::test]
async fn test_login_renews_session_token() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.get("/").await;
    let before = browser
        .cookie(SESSION_COOKIE_NAME.as_str())
        .map(str::to_string)
        .expect("No session cookie after first visit");

    browser.login_as(1).await;

    let after = browser
        .cookie(SESSION_COOKIE_NAME.as_str())
        .map(str::to_string)
        .expect("No session cookie after login");
    assert_ne!(before, after);

    // The pre-login token no longer names a session
    browser.set_cookie(SESSION_COOKIE_NAME.as_str(), &before);
    let response = browser.get("/account").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_ends_authentication() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.login_as(1).await;
    let token = browser.csrf_token().await;

    let response = browser
        .post_form("/user/logout", &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = browser.get("/account").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/user/login");
}

#[tokio::test]
async fn test_login_without_csrf_token_is_rejected() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.get("/").await;

    let response = browser.post_form("/user/login", &[("user_id", "1")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(browser.get("/account").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_deleted_user_is_treated_as_anonymous() {
    let (app, users) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.login_as(1).await;

    users.remove(1).await.expect("Failed to remove user");

    let response = browser.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.starts_with("authenticated=false"));

    let response = browser.get("/account").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.counters.hits(), 0);
}

#[tokio::test]
async fn test_user_store_failure_fails_closed() {
    let app = TestApp::with_users(Arc::new(FailingUsers));
    let mut browser = MockBrowser::new(app.router);

    // No user id yet, so the failing store is never consulted
    let response = browser.login_as(1).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = browser.get("/account").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.contains("unreachable"));
    assert_eq!(app.counters.hits(), 0);
}

#[tokio::test]
async fn test_anonymous_sessions_never_query_user_store() {
    let users = Arc::new(CountingUsers::default());
    let app = TestApp::with_users(users.clone());
    let mut browser = MockBrowser::new(app.router);

    browser.get("/").await;
    browser.get("/").await;
    browser.get("/account").await;
    assert_eq!(users.calls.load(Ordering::SeqCst), 0);

    browser.login_as(7).await;
    browser.get("/account").await;
    assert_eq!(users.calls.load(Ordering::SeqCst), 1);
}
