use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use formguard_axum::formguard::InMemoryUserStore;
use formguard_axum::{Chain, PipelineState, TemplateCache};

use crate::handlers::{
    fallback, home, ping, snippet_create, snippet_create_post, snippet_view, user_login,
    user_login_post, user_logout_post, user_signup, user_signup_post,
};
use crate::pages::{PageContent, template_cache};
use crate::snippets::SnippetStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) snippets: Arc<SnippetStore>,
    pub(crate) users: Arc<InMemoryUserStore>,
    pub(crate) templates: Arc<TemplateCache<PageContent>>,
}

impl AppState {
    pub(crate) fn new(users: Arc<InMemoryUserStore>) -> Self {
        Self {
            snippets: Arc::new(SnippetStore::default()),
            users,
            templates: Arc::new(template_cache()),
        }
    }
}

pub(crate) fn routes(app: AppState, pipeline: PipelineState) -> Router {
    let dynamic = Router::new()
        .route("/", get(home))
        .route("/snippet/view/{id}", get(snippet_view))
        .route("/user/signup", get(user_signup).post(user_signup_post))
        .route("/user/login", get(user_login).post(user_login_post));

    let protected = Router::new()
        .route(
            "/snippet/create",
            get(snippet_create).post(snippet_create_post),
        )
        .route("/user/logout", post(user_logout_post));

    let router = Router::new()
        .merge(Chain::dynamic(pipeline.clone()).then(dynamic))
        .merge(Chain::protected(pipeline.clone()).then(protected))
        .route("/ping", get(ping))
        .fallback(fallback)
        .with_state(app);

    Chain::standard(pipeline).then(router)
}
