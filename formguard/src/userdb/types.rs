use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::userdb::errors::UserError;

/// Registered account.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    /// Store-assigned identifier, never 0
    pub id: i64,
    pub name: String,
    pub email: String,
    /// bcrypt hash, salt and cost included
    #[serde(skip_serializing)]
    pub(crate) password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Answers whether a user id taken from a session still names an account.
///
/// Called once per request for sessions that carry a user id, possibly from
/// many request workers at the same time.
#[async_trait]
pub trait UserExistence: Send + Sync + 'static {
    async fn exists(&self, user_id: i64) -> Result<bool, UserError>;
}
