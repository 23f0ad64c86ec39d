mod auth;
mod csrf;
mod manager;
mod session;

pub use auth::{login, logout, resolve_authentication};
pub use csrf::{issue_csrf_token, verify_csrf_token};
pub use manager::SessionManager;
pub use session::Session;
