//! HTTP-level middleware (cross-cutting concerns).
//!
//! This module is for transport/infrastructure concerns that apply to all
//! routes, regardless of API version.
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Global timeouts
//! - Panic → JSON 500
//! - Response compression (gzip / brotli, negotiated via Accept-Encoding)

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::header::HeaderName;
use axum::response::IntoResponse;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::error_handler;

/// Apply HTTP-level middleware to the given Router.
///
/// Defaults:
/// - Request-Id header: `x-request-id`
/// - Timeout: 30 seconds
pub fn apply(router: Router) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let router = router
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::custom(error_handler::handle_panic));

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                AppError::RequestTimeout.into_response()
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                AppError::Internal.into_response()
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        // Access log / tracing for all requests.
        .layer(TraceLayer::new_for_http())
        // Bound request time.
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    router.layer(layers)
}
