use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::errors::SessionError;
use crate::session::types::{FLASH_KEY, SessionStatus, StoredSession};

/// Handle to the session record of the current request.
///
/// Cloning is cheap and every clone refers to the same record, so a handle
/// can be placed in the request extensions and mutated by inner layers and
/// the handler. Changes are persisted by [`SessionManager::commit`](super::SessionManager::commit).
#[derive(Clone, Debug)]
pub struct Session {
    pub(super) inner: Arc<Mutex<SessionInner>>,
}

#[derive(Debug)]
pub(super) struct SessionInner {
    pub(super) token: Option<String>,
    /// Token that must be deleted from the store on commit, set by renewal and destruction.
    pub(super) superseded_token: Option<String>,
    pub(super) values: BTreeMap<String, serde_json::Value>,
    pub(super) expires_at: DateTime<Utc>,
    pub(super) lifetime: Duration,
    pub(super) status: SessionStatus,
}

impl SessionInner {
    fn touch(&mut self) {
        self.status = SessionStatus::Modified;
    }
}

impl Session {
    pub(super) fn new(lifetime: Duration) -> Self {
        Self::from_inner(SessionInner {
            token: None,
            superseded_token: None,
            values: BTreeMap::new(),
            expires_at: Utc::now() + lifetime,
            lifetime,
            status: SessionStatus::Unmodified,
        })
    }

    pub(super) fn from_stored(token: String, stored: StoredSession, lifetime: Duration) -> Self {
        Self::from_inner(SessionInner {
            token: Some(token),
            superseded_token: None,
            values: stored.values,
            expires_at: stored.expires_at,
            lifetime,
            status: SessionStatus::Unmodified,
        })
    }

    fn from_inner(inner: SessionInner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// The token identifying this record, `None` until it is first committed.
    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.token.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status
    }

    pub async fn expires_at(&self) -> DateTime<Utc> {
        self.inner.lock().await.expires_at
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.lock().await.values.contains_key(key)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        let inner = self.inner.lock().await;
        inner
            .values
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(|e| SessionError::Storage(format!("Session value '{key}': {e}")))
    }

    /// Integer value for `key`, or 0 when it is absent or not an integer.
    pub async fn get_int(&self, key: &str) -> i64 {
        self.inner
            .lock()
            .await
            .values
            .get(key)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0)
    }

    pub async fn get_string(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .await
            .values
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)
            .map_err(|e| SessionError::Storage(format!("Session value '{key}': {e}")))?;
        let mut inner = self.inner.lock().await;
        inner.values.insert(key.to_string(), value);
        inner.touch();
        Ok(())
    }

    pub async fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        if inner.values.remove(key).is_some() {
            inner.touch();
        }
    }

    /// Reads a string value and deletes it in the same step.
    pub async fn pop_string(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let value = inner.values.remove(key)?;
        inner.touch();
        value.as_str().map(str::to_string)
    }

    pub async fn set_flash(&self, message: &str) -> Result<(), SessionError> {
        self.put(FLASH_KEY, message).await
    }

    pub async fn take_flash(&self) -> Option<String> {
        self.pop_string(FLASH_KEY).await
    }

    /// Keeps the data but moves it to a fresh token on commit and restarts the
    /// lifetime. The previous token is deleted from the store.
    pub async fn renew_token(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(old) = inner.token.take() {
            inner.superseded_token.get_or_insert(old);
        }
        inner.expires_at = Utc::now() + inner.lifetime;
        inner.touch();
    }

    /// Drops all data; on commit the record is deleted and the cookie expired.
    /// Writing to the session afterwards starts a new record under a new token.
    pub async fn destroy(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(old) = inner.token.take() {
            inner.superseded_token.get_or_insert(old);
        }
        inner.values.clear();
        inner.expires_at = Utc::now() + inner.lifetime;
        inner.status = SessionStatus::Destroyed;
    }
}
