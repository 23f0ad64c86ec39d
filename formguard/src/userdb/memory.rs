use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::userdb::errors::UserError;
use crate::userdb::types::{User, UserExistence};

/// Process-local account store.
pub struct InMemoryUserStore {
    users: RwLock<HashMap<i64, User>>,
    next_id: AtomicI64,
    hash_cost: u32,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(password: &str, cost: u32) -> Result<String, UserError> {
    hash(password, cost).map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hashed: &str) -> Result<bool, UserError> {
    verify(password, hashed).map_err(|e| UserError::PasswordHash(e.to_string()))
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            hash_cost: DEFAULT_COST,
        }
    }

    /// bcrypt work factor for passwords stored from now on.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Registers an account and returns its id. Emails are unique, compared
    /// case-insensitively.
    pub async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError> {
        let password_hash = hash_password(password, self.hash_cost)?;

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(UserError::DuplicateEmail);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                created_at: Utc::now(),
            },
        );
        tracing::debug!("Inserted user {id}");
        Ok(id)
    }

    pub async fn remove(&self, user_id: i64) -> Result<(), UserError> {
        self.users
            .write()
            .await
            .remove(&user_id)
            .map(|_| ())
            .ok_or(UserError::NotFound)
    }

    pub async fn get(&self, user_id: i64) -> Option<User> {
        self.users.read().await.get(&user_id).cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Returns the id of the account matching the credentials.
    /// Unknown email and wrong password are reported identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError> {
        let user = self
            .find_by_email(email)
            .await
            .ok_or(UserError::InvalidCredentials)?;

        if verify_password(password, &user.password_hash)? {
            Ok(user.id)
        } else {
            Err(UserError::InvalidCredentials)
        }
    }
}

#[async_trait]
impl UserExistence for InMemoryUserStore {
    async fn exists(&self, user_id: i64) -> Result<bool, UserError> {
        Ok(self.users.read().await.contains_key(&user_id))
    }
}
