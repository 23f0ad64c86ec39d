//! Page cache and the data every page is rendered with

use axum::response::{Html, IntoResponse, Response};
use chrono::{Datelike, Utc};
use http::StatusCode;
use std::collections::HashMap;

use formguard::{Session, Validator};

use super::error::{IntoResponseError, server_error};
use super::session::RequestContext;

/// Submitted form values and the validation messages collected for them,
/// kept so a rejected form can be shown again as the user filled it in.
#[derive(Debug, Clone, Default)]
pub struct FormView {
    values: HashMap<String, String>,
    validator: Validator,
}

impl FormView {
    pub fn new<I, K, V>(values: I, validator: Validator) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            validator,
        }
    }

    /// Submitted value of `field`, empty when nothing was submitted.
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.validator.field_error(field)
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.validator.non_field_errors
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

/// Everything a page template can show.
#[derive(Debug, Clone)]
pub struct TemplateData<C> {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    pub form: FormView,
    pub content: C,
}

impl<C> TemplateData<C> {
    pub fn with_form(mut self, form: FormView) -> Self {
        self.form = form;
        self
    }
}

/// Collects the per-request values for a page. Reading the flash message
/// removes it from the session.
pub async fn new_template_data<C>(
    ctx: &RequestContext,
    session: &Session,
    content: C,
) -> TemplateData<C> {
    TemplateData {
        current_year: Utc::now().year(),
        flash: session.take_flash().await,
        is_authenticated: ctx.is_authenticated(),
        csrf_token: ctx.csrf_token().to_string(),
        form: FormView::default(),
        content,
    }
}

/// A renderable page.
pub trait Page<C>: Send + Sync {
    fn render(&self, data: &TemplateData<C>) -> Result<String, askama::Error>;
}

impl<C, F> Page<C> for F
where
    F: Fn(&TemplateData<C>) -> Result<String, askama::Error> + Send + Sync,
{
    fn render(&self, data: &TemplateData<C>) -> Result<String, askama::Error> {
        self(data)
    }
}

/// Pages keyed by name, built once at startup.
pub struct TemplateCache<C> {
    pages: HashMap<String, Box<dyn Page<C>>>,
}

impl<C> Default for TemplateCache<C> {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }
}

impl<C> TemplateCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, name: &str, page: impl Page<C> + 'static) -> Self {
        self.pages.insert(name.to_string(), Box::new(page));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    /// Renders the page fully before anything is sent, so a failing page
    /// turns into a clean 500 rather than a truncated body.
    /// An unknown page name is a configuration error and also answers 500.
    pub fn render(&self, status: StatusCode, name: &str, data: &TemplateData<C>) -> Response {
        let Some(page) = self.pages.get(name) else {
            return server_error(&format!("the template {name} does not exist"));
        };

        match page.render(data).into_response_error() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(response) => response,
        }
    }
}
