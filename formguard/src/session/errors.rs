use thiserror::Error;

use crate::userdb::UserError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    /// The request failed anti-forgery verification. This is the only
    /// client-caused variant.
    #[error("CSRF token error: {0}")]
    CsrfToken(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(i64),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),

    /// Error from user database operations
    #[error("User error: {0}")]
    User(#[from] UserError),
}

impl SessionError {
    /// Whether the error was caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::CsrfToken(_))
    }
}
