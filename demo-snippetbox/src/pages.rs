use askama::Template;

use formguard_axum::{TemplateCache, TemplateData};

use crate::snippets::Snippet;

/// Page-specific content shared by every page of the app.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageContent {
    pub(crate) snippet: Option<Snippet>,
    pub(crate) snippets: Vec<Snippet>,
}

pub(crate) type Data = TemplateData<PageContent>;

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomePage<'a> {
    data: &'a Data,
}

#[derive(Template)]
#[template(path = "pages/view.html")]
struct ViewPage<'a> {
    data: &'a Data,
}

#[derive(Template)]
#[template(path = "pages/create.html")]
struct CreatePage<'a> {
    data: &'a Data,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
struct LoginPage<'a> {
    data: &'a Data,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
struct SignupPage<'a> {
    data: &'a Data,
}

pub(crate) fn template_cache() -> TemplateCache<PageContent> {
    TemplateCache::new()
        .insert("home.html", |data: &Data| HomePage { data }.render())
        .insert("view.html", |data: &Data| ViewPage { data }.render())
        .insert("create.html", |data: &Data| CreatePage { data }.render())
        .insert("login.html", |data: &Data| LoginPage { data }.render())
        .insert("signup.html", |data: &Data| SignupPage { data }.render())
}
