use axum::response::{IntoResponse, Response};
use http::StatusCode;
use std::backtrace::Backtrace;
use std::fmt::Display;

use formguard::SessionError;

/// Logs the error with a backtrace and answers a bare 500.
/// Nothing about the failure reaches the client.
pub fn server_error(err: &dyn Display) -> Response {
    let trace = Backtrace::force_capture();
    tracing::error!("{err}\n{trace}");
    client_error(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Answers `status` with its canonical reason phrase as the body.
pub fn client_error(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or("Error")).into_response()
}

pub fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}

/// Helper trait for turning core errors into finished responses
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, Response>;
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, Response> {
        self.map_err(|e| {
            if e.is_client_error() {
                tracing::warn!("Rejected request: {e}");
                client_error(StatusCode::BAD_REQUEST)
            } else {
                server_error(&e)
            }
        })
    }
}

impl<T> IntoResponseError<T> for Result<T, askama::Error> {
    fn into_response_error(self) -> Result<T, Response> {
        self.map_err(|e| server_error(&e))
    }
}
