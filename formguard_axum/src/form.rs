use axum::extract::{Form, FromRequest, Request};
use axum::response::Response;
use http::StatusCode;
use serde::de::DeserializeOwned;

use super::error::client_error;

/// Decodes an `application/x-www-form-urlencoded` body into `T`.
///
/// Any body that cannot be decoded is answered with 400 Bad Request.
#[derive(Debug, Clone)]
pub struct PostForm<T>(pub T);

impl<T, S> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Form rejected: {rejection}");
                Err(client_error(StatusCode::BAD_REQUEST))
            }
        }
    }
}
