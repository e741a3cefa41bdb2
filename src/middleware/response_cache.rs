//! Response caching middleware on top of `services::cache::ResponseCache`.
//!
//! Runs inside authentication. Only bodies with an exact size hint are
//! buffered; streaming bodies pass through untouched.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    body::{Body, HttpBody},
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::auth::token_source::{self, TokenRequest};
use crate::services::cache::{CacheControl, ResponseCache, response_cache};

pub fn apply(router: Router, cache: Arc<ResponseCache>) -> Router {
    if !cache.config().enabled {
        return router;
    }
    router.layer(middleware::from_fn_with_state(cache, response_cache_middleware))
}

async fn response_cache_middleware(
    State(cache): State<Arc<ResponseCache>>,
    OriginalUri(uri): OriginalUri,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let has_credential =
        token_source::credential(&TokenRequest::from_uri(&uri, req.headers())).is_some();

    if !response_cache::request_is_cacheable(&method, req.headers(), has_credential) {
        return next.run(req).await;
    }

    let directives = CacheControl::from_headers(req.headers());
    if directives.allows_cached_answer(req.headers()) {
        if let Some(hit) = cache.lookup(&method, &uri, req.headers(), Instant::now()) {
            tracing::debug!(%method, path = uri.path(), "response cache hit");
            return hit;
        }
    }
    if directives.only_if_cached {
        return AppError::GatewayTimeout.into_response();
    }

    let request_headers = req.headers().clone();
    let response = next.run(req).await;

    if response_cache::storable_ttl(response.status(), response.headers()).is_none() {
        return response;
    }
    let Some(len) = response.body().size_hint().exact() else {
        return response;
    };
    if len > cache.config().max_body_bytes as u64 {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, len as usize).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to buffer response for caching");
            return AppError::Internal.into_response();
        }
    };

    if cache.store(
        &method,
        &uri,
        &request_headers,
        parts.status,
        &parts.headers,
        bytes.clone(),
        Instant::now(),
    ) {
        tracing::debug!(%method, path = uri.path(), "response cached");
    }

    Response::from_parts(parts, Body::from(bytes))
}
