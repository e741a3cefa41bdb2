//! Per-route authorization. Runs after `access` and enforces a [`Policy`].

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::{AuthCtx, AuthFailure};
use crate::error::AppError;
use crate::services::auth::policy::{Decision, Policy};

/// Require `policy` on every route of `router`.
///
/// Uses `route_layer` so unmatched paths still fall through to the 404
/// fallback instead of being challenged.
pub fn require<S>(router: Router<S>, policy: Policy) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(
        Arc::new(policy),
        authorize_middleware,
    ))
}

async fn authorize_middleware(
    State(policy): State<Arc<Policy>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match policy.evaluate(req.extensions().get::<AuthCtx>()) {
        Decision::Allow => Ok(next.run(req).await),
        Decision::Challenge => {
            let invalid_token = req.extensions().get::<AuthFailure>().is_some();
            tracing::debug!(policy = policy.name, invalid_token, "authorization challenge");
            Err(AppError::unauthorized(invalid_token))
        }
        Decision::Forbid => {
            tracing::info!(policy = policy.name, "authorization forbidden");
            Err(AppError::Forbidden)
        }
    }
}
