//! formguard - session, anti-forgery and authentication-state core
//!
//! This crate holds the framework-independent parts of a request pipeline for
//! session-authenticated web services: session records on a pluggable cache
//! store, double-submit CSRF tokens, per-request authentication resolution
//! and a form validator. The `formguard_axum` crate wires them into axum.

mod session;
mod storage;
mod userdb;
mod utils;
mod validator;

pub use session::{
    AUTHENTICATED_USER_ID_KEY, AuthContext, AuthState, CSRF_COOKIE_NAME, CSRF_FORM_FIELD,
    CSRF_HEADER_NAME, CSRF_SECRET_KEY, CsrfToken, FLASH_KEY, SESSION_COOKIE_NAME,
    SESSION_LIFETIME, Session, SessionError, SessionManager, SessionStatus, is_safe_method,
    issue_csrf_token, login, logout, resolve_authentication, verify_csrf_token,
};

pub use storage::{
    CacheData, CacheStore, GENERIC_CACHE_STORE_TYPE, GENERIC_CACHE_STORE_URL, InMemoryCacheStore,
    RedisCacheStore, StorageError, cache_store_from_env,
};

pub use userdb::{InMemoryUserStore, User, UserError, UserExistence};

pub use utils::{UtilError, gen_random_string, get_cookie_value};

pub use validator::{
    EMAIL_RX, Validator, matches, max_chars, min_chars, not_blank, permitted_value,
};
