//! formguard-axum - axum request pipeline for formguard
//!
//! Composes panic recovery, request logging, security headers, session
//! load/save, CSRF protection and authentication resolution around an
//! application router in a fixed order, and provides the helpers handlers
//! use to answer requests.

mod chain;
mod config;
mod error;
mod form;
mod middleware;
mod session;
mod state;
mod templates;

pub use chain::{Chain, ChainError, Policy};
pub use config::{FG_CONTENT_SECURITY_POLICY, FG_LOGIN_URL, FG_MAX_FORM_BYTES};
pub use error::{IntoResponseError, client_error, not_found, server_error};
pub use form::PostForm;
pub use middleware::{
    authenticate, csrf_guard, handle_panic, insert_security_headers, load_and_save_session,
    require_authentication, secure_headers,
};
pub use session::RequestContext;
pub use state::PipelineState;
pub use templates::{FormView, Page, TemplateCache, TemplateData, new_template_data};

// Re-export the core crate so applications need only one dependency
pub use formguard;
