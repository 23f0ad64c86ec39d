use std::sync::Arc;

use formguard::{SessionManager, UserExistence};

use super::config::FG_LOGIN_URL;

/// Shared collaborators of the session-scoped policies.
#[derive(Clone)]
pub struct PipelineState {
    pub sessions: Arc<SessionManager>,
    pub users: Arc<dyn UserExistence>,
    pub login_url: String,
}

impl PipelineState {
    pub fn new(sessions: Arc<SessionManager>, users: Arc<dyn UserExistence>) -> Self {
        Self {
            sessions,
            users,
            login_url: FG_LOGIN_URL.clone(),
        }
    }

    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }
}
