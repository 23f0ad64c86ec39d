//! Ordered composition of the request policies around a router

use axum::{Router, middleware};
use thiserror::Error;
use tower_http::LatencyUnit;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::middleware::{
    authenticate, csrf_guard, handle_panic, load_and_save_session, require_authentication,
    secure_headers,
};
use super::state::PipelineState;

/// Request policies in their fixed outer-to-inner order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Policy {
    RecoverPanic,
    LogRequest,
    SecureHeaders,
    LoadAndSaveSession,
    CsrfGuard,
    Authenticate,
    RequireAuthentication,
}

impl Policy {
    fn prerequisite(self) -> Option<Policy> {
        match self {
            Policy::CsrfGuard | Policy::Authenticate => Some(Policy::LoadAndSaveSession),
            Policy::RequireAuthentication => Some(Policy::Authenticate),
            _ => None,
        }
    }

    /// Session-dependent policies wrap matched routes only, so unmatched
    /// paths never create a session.
    fn is_route_scoped(self) -> bool {
        self >= Policy::LoadAndSaveSession
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("{policy:?} must be placed before {last:?}")]
    OutOfOrder { policy: Policy, last: Policy },

    #[error("{0:?} is already in the chain")]
    Duplicate(Policy),

    #[error("{policy:?} needs {missing:?} earlier in the chain")]
    MissingPrerequisite { policy: Policy, missing: Policy },
}

/// Builder for a list of policies that can only grow inwards.
///
/// The standard chain wraps the whole application. The dynamic chain adds
/// the session, CSRF and authentication policies, and the protected chain
/// also requires an authenticated caller:
///
/// ```no_run
/// # use axum::{Router, routing::get};
/// # use formguard_axum::{Chain, PipelineState};
/// # fn app(state: PipelineState) -> Router {
/// let dynamic = Router::new().route("/", get(|| async { "home" }));
/// let protected = Router::new().route("/account", get(|| async { "account" }));
///
/// let routes = Router::new()
///     .merge(Chain::dynamic(state.clone()).then(dynamic))
///     .merge(Chain::protected(state.clone()).then(protected));
/// Chain::standard(state).then(routes)
/// # }
/// ```
#[derive(Clone)]
pub struct Chain {
    state: PipelineState,
    policies: Vec<Policy>,
}

impl Chain {
    pub fn new(state: PipelineState) -> Self {
        Self {
            state,
            policies: Vec::new(),
        }
    }

    /// Panic recovery, request logging and security headers.
    pub fn standard(state: PipelineState) -> Self {
        Self {
            state,
            policies: vec![Policy::RecoverPanic, Policy::LogRequest, Policy::SecureHeaders],
        }
    }

    /// Session load/save, CSRF guard and authentication resolution.
    pub fn dynamic(state: PipelineState) -> Self {
        Self {
            state,
            policies: vec![
                Policy::LoadAndSaveSession,
                Policy::CsrfGuard,
                Policy::Authenticate,
            ],
        }
    }

    /// The dynamic chain plus the authentication gate.
    pub fn protected(state: PipelineState) -> Self {
        let mut chain = Self::dynamic(state);
        chain.policies.push(Policy::RequireAuthentication);
        chain
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Adds `policy` inside every policy already in the chain.
    pub fn append(mut self, policy: Policy) -> Result<Self, ChainError> {
        if self.policies.contains(&policy) {
            return Err(ChainError::Duplicate(policy));
        }
        if let Some(&last) = self.policies.last() {
            if policy < last {
                return Err(ChainError::OutOfOrder { policy, last });
            }
        }
        if let Some(missing) = policy.prerequisite() {
            if !self.policies.contains(&missing) {
                return Err(ChainError::MissingPrerequisite { policy, missing });
            }
        }
        self.policies.push(policy);
        Ok(self)
    }

    /// Wraps `router` in the chain, first policy outermost.
    ///
    /// Session-dependent policies are attached with `route_layer`, so the
    /// router must already hold its routes.
    pub fn then<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let state = self.state;
        self.policies
            .iter()
            .rev()
            .fold(router, |router, &policy| {
                tracing::trace!(
                    "Applying {policy:?} ({})",
                    if policy.is_route_scoped() { "routes" } else { "router" }
                );
                match policy {
                    Policy::RecoverPanic => router.layer(CatchPanicLayer::custom(handle_panic)),
                    Policy::LogRequest => router.layer(
                        TraceLayer::new_for_http()
                            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                            .on_request(DefaultOnRequest::new().level(Level::INFO))
                            .on_response(
                                DefaultOnResponse::new()
                                    .level(Level::INFO)
                                    .latency_unit(LatencyUnit::Millis),
                            ),
                    ),
                    Policy::SecureHeaders => router.layer(middleware::from_fn(secure_headers)),
                    Policy::LoadAndSaveSession => router.route_layer(
                        middleware::from_fn_with_state(state.clone(), load_and_save_session),
                    ),
                    Policy::CsrfGuard => router.route_layer(middleware::from_fn(csrf_guard)),
                    Policy::Authenticate => router.route_layer(
                        middleware::from_fn_with_state(state.clone(), authenticate),
                    ),
                    Policy::RequireAuthentication => router.route_layer(
                        middleware::from_fn_with_state(state.clone(), require_authentication),
                    ),
                }
            })
    }
}
