use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::{AuthCtx, AuthFailure};

/// Extractor handing `AuthCtx` to handlers.
/// Relies on the access middleware having inserted it into request extensions;
/// when missing the request is rejected with a 401 challenge.
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthCtx>() {
            Some(ctx) => Ok(AuthCtxExtractor(ctx.clone())),
            None => Err(AppError::unauthorized(
                parts.extensions.get::<AuthFailure>().is_some(),
            )),
        }
    }
}
