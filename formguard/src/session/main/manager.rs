use chrono::{Duration, Utc};
use http::HeaderMap;
use tokio::sync::Mutex;

use crate::session::config::{SESSION_COOKIE_NAME, SESSION_LIFETIME};
use crate::session::errors::SessionError;
use crate::session::types::{SESSION_PREFIX, SessionStatus, StoredSession};
use crate::storage::{CacheData, CacheStore, cache_store_from_env};
use crate::utils::{gen_random_string, get_cookie_value, header_set_cookie};

use super::session::Session;

const SESSION_TOKEN_BYTES: usize = 32;

/// Loads session records at the start of a request and commits them at the end.
///
/// The backing store sits behind an async mutex so one manager can be shared
/// by every request worker. Two requests carrying the same token are not
/// serialised against each other: whichever commits last wins.
pub struct SessionManager {
    store: Mutex<Box<dyn CacheStore>>,
    lifetime: Duration,
    cookie_name: String,
}

impl SessionManager {
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self {
            store: Mutex::new(store),
            lifetime: Duration::seconds(*SESSION_LIFETIME as i64),
            cookie_name: SESSION_COOKIE_NAME.to_string(),
        }
    }

    /// Builds a manager on the cache store selected by `GENERIC_CACHE_STORE_TYPE`.
    pub async fn from_env() -> Result<Self, SessionError> {
        let store = cache_store_from_env()
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        Ok(Self::new(store))
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Loads the session named by the request's session cookie, or starts an
    /// empty one when the cookie is absent, unknown or expired.
    pub async fn load_from_headers(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let token = get_cookie_value(headers, &self.cookie_name);
        self.load(token.as_deref()).await
    }

    #[tracing::instrument(skip_all, fields(has_token = token.is_some()))]
    pub async fn load(&self, token: Option<&str>) -> Result<Session, SessionError> {
        let Some(token) = token else {
            return Ok(Session::new(self.lifetime));
        };

        let cached = self
            .store
            .lock()
            .await
            .get(SESSION_PREFIX, token)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let Some(cached) = cached else {
            tracing::debug!("Session token not found in store, starting a new session");
            return Ok(Session::new(self.lifetime));
        };

        let stored: StoredSession = cached.try_into()?;

        if stored.expires_at <= Utc::now() {
            tracing::debug!("Session expired at {}", stored.expires_at);
            self.store
                .lock()
                .await
                .remove(SESSION_PREFIX, token)
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            return Ok(Session::new(self.lifetime));
        }

        Ok(Session::from_stored(token.to_string(), stored, self.lifetime))
    }

    /// Persists the changes made to `session` during the request.
    ///
    /// Returns the `Set-Cookie` headers to attach to the response: the session
    /// cookie when the record was written, an expired cookie when it was
    /// destroyed, nothing when it was left untouched.
    #[tracing::instrument(skip_all)]
    pub async fn commit(&self, session: &Session) -> Result<HeaderMap, SessionError> {
        let mut inner = session.inner.lock().await;
        let mut headers = HeaderMap::new();

        if inner.status == SessionStatus::Unmodified {
            return Ok(headers);
        }

        let mut store = self.store.lock().await;

        if inner.status == SessionStatus::Modified {
            let token = match inner.token.clone() {
                Some(token) => token,
                None => {
                    let token = gen_random_string(SESSION_TOKEN_BYTES)?;
                    inner.token = Some(token.clone());
                    token
                }
            };

            let ttl = (inner.expires_at - Utc::now()).num_seconds().max(1);
            let stored = StoredSession {
                values: inner.values.clone(),
                expires_at: inner.expires_at,
            };

            // The superseded record stays in place until its replacement is stored
            store
                .put_with_ttl(
                    SESSION_PREFIX,
                    &token,
                    CacheData::try_from(&stored)?,
                    ttl as usize,
                )
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;

            header_set_cookie(&mut headers, &self.cookie_name, &token, ttl)?;
        } else {
            header_set_cookie(&mut headers, &self.cookie_name, "", -1)?;
        }

        if let Some(old) = inner.superseded_token.clone() {
            tracing::debug!("Deleting superseded session token");
            store
                .remove(SESSION_PREFIX, &old)
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            inner.superseded_token = None;
        }

        inner.status = SessionStatus::Unmodified;
        Ok(headers)
    }
}
