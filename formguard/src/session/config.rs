use std::sync::LazyLock;

const DEFAULT_SESSION_LIFETIME: u64 = 12 * 60 * 60;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Seconds from `SESSION_LIFETIME`; unset or unparsable values give 12 hours.
fn session_lifetime_from_env() -> u64 {
    std::env::var("SESSION_LIFETIME")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SESSION_LIFETIME)
}

pub static SESSION_COOKIE_NAME: LazyLock<String> =
    LazyLock::new(|| env_or("SESSION_COOKIE_NAME", "session"));

/// Absolute session lifetime in seconds, measured from creation.
pub static SESSION_LIFETIME: LazyLock<u64> = LazyLock::new(session_lifetime_from_env);

pub static CSRF_COOKIE_NAME: LazyLock<String> =
    LazyLock::new(|| env_or("CSRF_COOKIE_NAME", "csrf_token"));

pub static CSRF_FORM_FIELD: LazyLock<String> =
    LazyLock::new(|| env_or("CSRF_FORM_FIELD", "csrf_token"));

pub static CSRF_HEADER_NAME: LazyLock<String> =
    LazyLock::new(|| env_or("CSRF_HEADER_NAME", "X-CSRF-Token"));
