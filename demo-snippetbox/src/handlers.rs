use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use http::StatusCode;
use serde::Deserialize;

use formguard_axum::formguard::{
    EMAIL_RX, Session, UserError, Validator, login, logout, matches, max_chars, min_chars,
    not_blank, permitted_value,
};
use formguard_axum::{
    FormView, IntoResponseError, PostForm, RequestContext, new_template_data, not_found,
    server_error,
};

use crate::app::AppState;
use crate::pages::PageContent;

const BLANK: &str = "This field cannot be blank";

#[derive(Debug, Deserialize)]
pub(crate) struct SnippetCreateForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    expires: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserSignupForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub(crate) async fn ping() -> &'static str {
    "OK"
}

pub(crate) async fn fallback() -> Response {
    not_found()
}

pub(crate) async fn home(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
) -> Response {
    let content = PageContent {
        snippets: app.snippets.latest().await,
        ..Default::default()
    };
    let data = new_template_data(&ctx, &session, content).await;
    app.templates.render(StatusCode::OK, "home.html", &data)
}

pub(crate) async fn snippet_view(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = id.parse::<i64>().ok().filter(|id| *id >= 1) else {
        return not_found();
    };
    let Some(snippet) = app.snippets.get(id).await else {
        return not_found();
    };

    let content = PageContent {
        snippet: Some(snippet),
        ..Default::default()
    };
    let data = new_template_data(&ctx, &session, content).await;
    app.templates.render(StatusCode::OK, "view.html", &data)
}

pub(crate) async fn snippet_create(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
) -> Response {
    let data = new_template_data(&ctx, &session, PageContent::default())
        .await
        .with_form(FormView::new([("expires", "365")], Validator::new()));
    app.templates.render(StatusCode::OK, "create.html", &data)
}

pub(crate) async fn snippet_create_post(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
    PostForm(form): PostForm<SnippetCreateForm>,
) -> Response {
    let mut v = Validator::new();
    v.check_field(not_blank(&form.title), "title", BLANK);
    v.check_field(
        max_chars(&form.title, 100),
        "title",
        "This field cannot be more than 100 characters long",
    );
    v.check_field(not_blank(&form.content), "content", BLANK);
    v.check_field(
        permitted_value(&form.expires, &[1, 7, 365]),
        "expires",
        "This field must equal 1, 7 or 365",
    );

    if !v.valid() {
        let view = FormView::new(
            [
                ("title", form.title),
                ("content", form.content),
                ("expires", form.expires.to_string()),
            ],
            v,
        );
        let data = new_template_data(&ctx, &session, PageContent::default())
            .await
            .with_form(view);
        return app
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create.html", &data);
    }

    let id = app
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await;

    if let Err(response) = session
        .set_flash("Snippet successfully created!")
        .await
        .into_response_error()
    {
        return response;
    }
    Redirect::to(&format!("/snippet/view/{id}")).into_response()
}

pub(crate) async fn user_signup(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
) -> Response {
    let data = new_template_data(&ctx, &session, PageContent::default()).await;
    app.templates.render(StatusCode::OK, "signup.html", &data)
}

pub(crate) async fn user_signup_post(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
    PostForm(form): PostForm<UserSignupForm>,
) -> Response {
    let mut v = Validator::new();
    v.check_field(not_blank(&form.name), "name", BLANK);
    v.check_field(not_blank(&form.email), "email", BLANK);
    v.check_field(
        matches(&form.email, &EMAIL_RX),
        "email",
        "This field must be a valid email address",
    );
    v.check_field(not_blank(&form.password), "password", BLANK);
    v.check_field(
        min_chars(&form.password, 8),
        "password",
        "This field must be at least 8 characters long",
    );

    if v.valid() {
        match app
            .users
            .insert(&form.name, &form.email, &form.password)
            .await
        {
            Ok(_) => {
                if let Err(response) = session
                    .set_flash("Your signup was successful. Please log in.")
                    .await
                    .into_response_error()
                {
                    return response;
                }
                return Redirect::to("/user/login").into_response();
            }
            Err(UserError::DuplicateEmail) => {
                v.add_field_error("email", "Email address is already in use");
            }
            Err(e) => return server_error(&e),
        }
    }

    let view = FormView::new([("name", form.name), ("email", form.email)], v);
    let data = new_template_data(&ctx, &session, PageContent::default())
        .await
        .with_form(view);
    app.templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data)
}

pub(crate) async fn user_login(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
) -> Response {
    let data = new_template_data(&ctx, &session, PageContent::default()).await;
    app.templates.render(StatusCode::OK, "login.html", &data)
}

pub(crate) async fn user_login_post(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    ctx: RequestContext,
    PostForm(form): PostForm<UserLoginForm>,
) -> Response {
    let mut v = Validator::new();
    v.check_field(not_blank(&form.email), "email", BLANK);
    v.check_field(
        matches(&form.email, &EMAIL_RX),
        "email",
        "This field must be a valid email address",
    );
    v.check_field(not_blank(&form.password), "password", BLANK);

    if v.valid() {
        match app.users.authenticate(&form.email, &form.password).await {
            Ok(user_id) => {
                return match login(&session, user_id).await.into_response_error() {
                    Ok(()) => Redirect::to("/snippet/create").into_response(),
                    Err(response) => response,
                };
            }
            Err(UserError::InvalidCredentials) => {
                v.add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return server_error(&e),
        }
    }

    let view = FormView::new([("email", form.email)], v);
    let data = new_template_data(&ctx, &session, PageContent::default())
        .await
        .with_form(view);
    app.templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data)
}

pub(crate) async fn user_logout_post(Extension(session): Extension<Session>) -> Response {
    logout(&session).await;
    if let Err(response) = session
        .set_flash("You've been logged out successfully!")
        .await
        .into_response_error()
    {
        return response;
    }
    Redirect::to("/").into_response()
}
