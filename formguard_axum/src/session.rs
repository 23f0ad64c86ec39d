use axum::extract::FromRequestParts;
use http::request::Parts;
use std::convert::Infallible;

use formguard::{AuthContext, CsrfToken};

/// Per-request values computed by the pipeline, available as an axum extractor.
///
/// Outside routes wrapped by the authentication policy the context is
/// anonymous, and outside routes wrapped by the CSRF guard it has no token.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub auth: AuthContext,
    pub csrf_token: Option<CsrfToken>,
}

impl RequestContext {
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Token to embed in forms, empty when the CSRF guard did not run.
    pub fn csrf_token(&self) -> &str {
        self.csrf_token.as_ref().map(CsrfToken::as_str).unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            auth: parts
                .extensions
                .get::<AuthContext>()
                .copied()
                .unwrap_or_default(),
            csrf_token: parts.extensions.get::<CsrfToken>().cloned(),
        })
    }
}
