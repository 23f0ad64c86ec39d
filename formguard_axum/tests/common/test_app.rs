use async_trait::async_trait;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::Duration;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use formguard::{
    InMemoryCacheStore, InMemoryUserStore, Session, SessionManager, UserError, UserExistence,
    login, logout,
};
use formguard_axum::{Chain, IntoResponseError, PipelineState, PostForm, RequestContext};

/// Counts handler invocations so tests can tell whether a request got through.
#[derive(Clone, Default)]
pub struct Counters {
    pub handler_hits: Arc<AtomicUsize>,
}

impl Counters {
    pub fn hits(&self) -> usize {
        self.handler_hits.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.handler_hits.fetch_add(1, Ordering::SeqCst);
    }
}

/// User store that answers every lookup with an error.
pub struct FailingUsers;

#[async_trait]
impl UserExistence for FailingUsers {
    async fn exists(&self, _user_id: i64) -> Result<bool, UserError> {
        Err(UserError::Storage("database is unreachable".to_string()))
    }
}

/// User store that knows every id and counts how often it was asked.
#[derive(Default)]
pub struct CountingUsers {
    pub calls: AtomicUsize,
}

#[async_trait]
impl UserExistence for CountingUsers {
    async fn exists(&self, _user_id: i64) -> Result<bool, UserError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

pub struct TestApp {
    pub router: Router,
    pub counters: Counters,
}

#[derive(Deserialize)]
struct LoginForm {
    user_id: i64,
}

async fn home(ctx: RequestContext) -> String {
    format!(
        "authenticated={} token={}",
        ctx.is_authenticated(),
        ctx.csrf_token()
    )
}

async fn submit(State(counters): State<Counters>) -> &'static str {
    counters.hit();
    "submitted"
}

async fn account(State(counters): State<Counters>, ctx: RequestContext) -> String {
    counters.hit();
    format!("user={}", ctx.auth.user_id().unwrap_or_default())
}

async fn login_user(
    Extension(session): Extension<Session>,
    PostForm(form): PostForm<LoginForm>,
) -> Response {
    match login(&session, form.user_id).await.into_response_error() {
        Ok(()) => Redirect::to("/account").into_response(),
        Err(response) => response,
    }
}

async fn logout_user(Extension(session): Extension<Session>) -> Redirect {
    logout(&session).await;
    Redirect::to("/")
}

async fn set_flash(Extension(session): Extension<Session>) -> Response {
    match session.set_flash("Saved!").await.into_response_error() {
        Ok(()) => Redirect::to("/flash").into_response(),
        Err(response) => response,
    }
}

async fn read_flash(Extension(session): Extension<Session>) -> String {
    session.take_flash().await.unwrap_or_default()
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

impl TestApp {
    /// App backed by an in-memory user store holding one user with id 1.
    pub async fn start() -> (Self, Arc<InMemoryUserStore>) {
        let users = Arc::new(InMemoryUserStore::new().with_hash_cost(4));
        users
            .insert("Alice", "alice@example.com", "pa55word")
            .await
            .expect("Failed to insert test user");
        (Self::with_users(users.clone()), users)
    }

    pub fn with_users(users: Arc<dyn UserExistence>) -> Self {
        let sessions = Arc::new(
            SessionManager::new(Box::new(InMemoryCacheStore::new()))
                .with_lifetime(Duration::hours(12)),
        );
        let state = PipelineState::new(sessions, users).with_login_url("/user/login");
        let counters = Counters::default();

        let dynamic = Router::new()
            .route("/", get(home))
            .route("/submit", post(submit))
            .route("/user/login", post(login_user))
            .route("/user/logout", post(logout_user))
            .route("/flash", get(read_flash).post(set_flash))
            .route("/panic", get(explode));

        let protected = Router::new()
            .route("/account", get(account))
            .route("/account/update", post(submit));

        let routes = Router::new()
            .merge(Chain::dynamic(state.clone()).then(dynamic))
            .merge(Chain::protected(state.clone()).then(protected))
            .route("/ping", get(|| async { "OK" }))
            .with_state(counters.clone());

        Self {
            router: Chain::standard(state).then(routes),
            counters,
        }
    }
}
