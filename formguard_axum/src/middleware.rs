use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use http::{
    HeaderMap, HeaderValue, StatusCode,
    header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, SET_COOKIE, VARY},
};
use std::any::Any;

use formguard::{
    AuthContext, CSRF_COOKIE_NAME, CSRF_FORM_FIELD, CSRF_HEADER_NAME, Session, get_cookie_value,
    is_safe_method, issue_csrf_token, resolve_authentication, verify_csrf_token,
};

use super::config::{FG_CONTENT_SECURITY_POLICY, FG_MAX_FORM_BYTES};
use super::error::{IntoResponseError, client_error, server_error};
use super::state::PipelineState;

/// Sets the fixed security header set, replacing any value set further in.
pub fn insert_security_headers(headers: &mut HeaderMap) {
    match HeaderValue::from_str(FG_CONTENT_SECURITY_POLICY.as_str()) {
        Ok(csp) => {
            headers.insert("Content-Security-Policy", csp);
        }
        Err(e) => tracing::error!("Invalid Content-Security-Policy value: {e}"),
    }
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("origin-when-cross-origin"),
    );
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("deny"));
    headers.insert("X-XSS-Protection", HeaderValue::from_static("0"));
}

pub async fn secure_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    insert_security_headers(response.headers_mut());
    response
}

/// Response for a panic caught anywhere inside the chain.
///
/// The connection is closed after the response so a worker that panicked
/// mid-request never hands a half-used connection back to the client.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };

    let mut response = server_error(&format!("panic: {detail}"));
    let headers = response.headers_mut();
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    insert_security_headers(headers);
    response
}

fn append_set_cookies(response: &mut Response, cookies: &HeaderMap) {
    for value in cookies.get_all(SET_COOKIE) {
        response.headers_mut().append(SET_COOKIE, value.clone());
    }
}

fn request_session(req: &Request) -> Result<Session, Response> {
    req.extensions().get::<Session>().cloned().ok_or_else(|| {
        server_error(&"Session policy is missing from the chain for this route")
    })
}

/// Loads the session before the inner layers run and commits it afterwards.
pub async fn load_and_save_session(
    State(state): State<PipelineState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match state
        .sessions
        .load_from_headers(req.headers())
        .await
        .into_response_error()
    {
        Ok(session) => session,
        Err(response) => return response,
    };
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    match state.sessions.commit(&session).await.into_response_error() {
        Ok(cookies) => append_set_cookies(&mut response, &cookies),
        Err(response) => return response,
    }
    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("Cookie"));
    response
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Pulls the submitted token from the header, or else from the form body.
/// A consumed body is put back so the handler can still decode it.
async fn submitted_csrf_token(req: Request) -> Result<(Request, Option<String>), Response> {
    if let Some(token) = req
        .headers()
        .get(CSRF_HEADER_NAME.as_str())
        .and_then(|v| v.to_str().ok())
    {
        let token = token.to_string();
        return Ok((req, Some(token)));
    }

    if !is_form_urlencoded(req.headers()) {
        return Ok((req, None));
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, *FG_MAX_FORM_BYTES).await.map_err(|e| {
        tracing::debug!("Failed to read form body: {e}");
        client_error(StatusCode::BAD_REQUEST)
    })?;

    let token = url::form_urlencoded::parse(&bytes)
        .find(|(key, _)| key == CSRF_FORM_FIELD.as_str())
        .map(|(_, value)| value.into_owned());

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

/// Double-submit anti-forgery check.
///
/// Unsafe methods must present a token matching the session secret and the
/// secret cookie, or the request ends here with 400. Every request that gets
/// through carries a fresh token for the page it renders.
pub async fn csrf_guard(req: Request, next: Next) -> Response {
    let session = match request_session(&req) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let cookie_secret = get_cookie_value(req.headers(), CSRF_COOKIE_NAME.as_str());

    let mut req = if is_safe_method(req.method()) {
        req
    } else {
        let (req, submitted) = match submitted_csrf_token(req).await {
            Ok(found) => found,
            Err(response) => return response,
        };
        if let Err(response) =
            verify_csrf_token(&session, submitted.as_deref(), cookie_secret.as_deref())
                .await
                .into_response_error()
        {
            return response;
        }
        req
    };

    let (token, cookies) = match issue_csrf_token(&session, cookie_secret.as_deref())
        .await
        .into_response_error()
    {
        Ok(issued) => issued,
        Err(response) => return response,
    };
    req.extensions_mut().insert(token);

    let mut response = next.run(req).await;
    append_set_cookies(&mut response, &cookies);
    response
}

/// Resolves the caller's authentication state once and attaches it to the request.
pub async fn authenticate(
    State(state): State<PipelineState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match request_session(&req) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let auth = match resolve_authentication(&session, state.users.as_ref())
        .await
        .into_response_error()
    {
        Ok(auth) => auth,
        Err(response) => return response,
    };
    req.extensions_mut().insert(auth);

    next.run(req).await
}

/// Lets only authenticated callers through; everyone else is sent to the login page.
/// Both outcomes are marked as not cacheable.
pub async fn require_authentication(
    State(state): State<PipelineState>,
    req: Request,
    next: Next,
) -> Response {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .unwrap_or_default();

    let mut response = if auth.is_authenticated() {
        next.run(req).await
    } else {
        tracing::debug!("Redirecting anonymous request to {}", state.login_url);
        Redirect::to(&state.login_url).into_response()
    };

    response
        .headers_mut()
        .append(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
