use http::StatusCode;
use http::header::{CONNECTION, SET_COOKIE, VARY};

use crate::common::{MockBrowser, TestApp, body_text};
use formguard::{CSRF_COOKIE_NAME, SESSION_COOKIE_NAME};

fn assert_security_headers(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(
        headers["Content-Security-Policy"],
        "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com"
    );
    assert_eq!(headers["Referrer-Policy"], "origin-when-cross-origin");
    assert_eq!(headers["X-Content-Type-Options"], "nosniff");
    assert_eq!(headers["X-Frame-Options"], "deny");
    assert_eq!(headers["X-XSS-Protection"], "0");
}

#[tokio::test]
async fn test_security_headers_on_success() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_security_headers(&response);
}

#[tokio::test]
async fn test_security_headers_on_unmatched_path() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.get("/no/such/page").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_security_headers(&response);
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_security_headers_on_rejected_request() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.post_form("/submit", &[]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_security_headers(&response);
}

#[tokio::test]
async fn test_panic_is_contained() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.get("/panic").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[CONNECTION], "close");
    assert_security_headers(&response);
    let body = body_text(response).await;
    assert!(!body.contains("exploded"));

    // The router keeps serving after a panic
    assert_eq!(browser.get("/").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_static_route_gets_no_session() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.get("/ping").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_security_headers(&response);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_first_visit_starts_session() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let response = browser.get("/").await;

    assert_eq!(response.headers()[VARY], "Cookie");
    let cookies: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
    }
    assert!(browser.cookie(SESSION_COOKIE_NAME.as_str()).is_some());
    assert!(browser.cookie(CSRF_COOKIE_NAME.as_str()).is_some());
}

#[tokio::test]
async fn test_unchanged_session_is_not_rewritten() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    browser.get("/").await;

    let response = browser.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_session_data_survives_between_requests() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);
    let token = browser.csrf_token().await;

    let response = browser
        .post_form("/flash", &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(body_text(browser.get("/flash").await).await, "Saved!");
    // Flash messages are shown once
    assert_eq!(body_text(browser.get("/flash").await).await, "");
}

#[tokio::test]
async fn test_tokens_are_masked_per_request() {
    let (app, _) = TestApp::start().await;
    let mut browser = MockBrowser::new(app.router);

    let first = browser.csrf_token().await;
    let second = browser.csrf_token().await;

    assert_ne!(first, second);
    assert_ne!(Some(first.as_str()), browser.cookie(CSRF_COOKIE_NAME.as_str()));
}
