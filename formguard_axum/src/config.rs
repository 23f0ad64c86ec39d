//! Environment-driven settings of the axum integration

use std::sync::LazyLock;

const DEFAULT_LOGIN_URL: &str = "/user/login";

/// Same as axum's `DefaultBodyLimit`, so the CSRF guard never refuses a form
/// the handler's extractor would accept.
const DEFAULT_MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

pub(crate) const DEFAULT_CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

fn login_url(env_value: Option<String>) -> String {
    env_value.unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string())
}

fn content_security_policy(env_value: Option<String>) -> String {
    env_value.unwrap_or_else(|| DEFAULT_CONTENT_SECURITY_POLICY.to_string())
}

fn max_form_bytes(env_value: Option<String>) -> usize {
    env_value
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_FORM_BYTES)
}

/// Where the authentication gate sends anonymous callers.
/// Default: "/user/login"
pub static FG_LOGIN_URL: LazyLock<String> =
    LazyLock::new(|| login_url(std::env::var("FG_LOGIN_URL").ok()));

/// Value of the `Content-Security-Policy` header added to every response.
pub static FG_CONTENT_SECURITY_POLICY: LazyLock<String> = LazyLock::new(|| {
    content_security_policy(std::env::var("FG_CONTENT_SECURITY_POLICY").ok())
});

/// Largest form body the CSRF guard buffers while looking for the token field.
/// Default: 2 MiB
pub static FG_MAX_FORM_BYTES: LazyLock<usize> =
    LazyLock::new(|| max_form_bytes(std::env::var("FG_MAX_FORM_BYTES").ok()));
