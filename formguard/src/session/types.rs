use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::session::errors::SessionError;
use crate::storage::CacheData;

/// Session key holding the id of the logged-in user. Absent or zero means anonymous.
pub const AUTHENTICATED_USER_ID_KEY: &str = "authenticatedUserID";

/// Session key holding a one-shot message shown on the next rendered page.
pub const FLASH_KEY: &str = "flash";

/// Session key holding the base64url-encoded anti-forgery secret.
pub const CSRF_SECRET_KEY: &str = "csrfSecret";

pub(super) const SESSION_PREFIX: &str = "session";

/// Session record as persisted in the cache store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredSession {
    pub(super) values: BTreeMap<String, serde_json::Value>,
    pub(super) expires_at: DateTime<Utc>,
}

impl TryFrom<&StoredSession> for CacheData {
    type Error = SessionError;

    fn try_from(data: &StoredSession) -> Result<Self, Self::Error> {
        Ok(Self {
            value: serde_json::to_string(data).map_err(|e| SessionError::Storage(e.to_string()))?,
        })
    }
}

impl TryFrom<CacheData> for StoredSession {
    type Error = SessionError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        serde_json::from_str(&data.value).map_err(|e| SessionError::Storage(e.to_string()))
    }
}

/// What has happened to a session since it was loaded for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unmodified,
    Modified,
    Destroyed,
}

/// Per-request anti-forgery token rendered into forms. It is derived from the
/// session secret but never equal to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated { user_id: i64 },
}

/// Authentication outcome for one request. Computed once, then only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    state: AuthState,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            state: AuthState::Anonymous,
        }
    }

    pub fn authenticated(user_id: i64) -> Self {
        Self {
            state: AuthState::Authenticated { user_id },
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self.state {
            AuthState::Authenticated { user_id } => Some(user_id),
            AuthState::Anonymous => None,
        }
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Read-only methods never need an anti-forgery token.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}
