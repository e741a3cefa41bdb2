//! Access-token authentication: resolve the credential → validate → put
//! `AuthCtx` into request extensions.
//!
//! This layer never rejects a request. Anonymous requests pass through and
//! the per-route authorization layer (or the `AuthCtxExtractor`) decides
//! whether a 401/403 is due. When a credential was presented but failed
//! validation an `AuthFailure` marker is stored instead, so the challenge can
//! say `error="invalid_token"`.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::{AuthCtx, AuthFailure};
use crate::services::auth::token_source::{self, TokenRequest};
use crate::state::AppState;

/// Apply authentication to every route of the given Router.
///
/// Must wrap the whole router (not a nested one) so that hub paths are seen
/// with their full `/hubs/...` prefix.
pub fn apply(router: Router, state: AppState) -> Router {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let resolved = token_source::credential(&TokenRequest::from_uri(&original_uri, req.headers()));

    let Some(resolved) = resolved else {
        return next.run(req).await;
    };

    match state.auth.verify_verified(&resolved.value) {
        Ok(verified) => {
            tracing::debug!(
                source = resolved.source.as_str(),
                subject = verified.subject.as_deref().unwrap_or("-"),
                "access token accepted"
            );
            let auth_ctx = AuthCtx::new(verified, resolved.value, resolved.source);
            // middleware → extractor handoff
            req.extensions_mut().insert(auth_ctx);
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                source = resolved.source.as_str(),
                path = original_uri.path(),
                "access token verification failed"
            );
            req.extensions_mut().insert(AuthFailure);
        }
    }

    next.run(req).await
}
