mod config;
mod errors;
mod main;
mod types;

pub use config::{
    CSRF_COOKIE_NAME, CSRF_FORM_FIELD, CSRF_HEADER_NAME, SESSION_COOKIE_NAME, SESSION_LIFETIME,
};
pub use errors::SessionError;
pub use main::{
    Session, SessionManager, issue_csrf_token, login, logout, resolve_authentication,
    verify_csrf_token,
};
pub use types::{
    AUTHENTICATED_USER_ID_KEY, AuthContext, AuthState, CSRF_SECRET_KEY, CsrfToken, FLASH_KEY,
    SessionStatus, is_safe_method,
};
