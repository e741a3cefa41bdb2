/*
 * Responsibility
 * - Global error handling: every error that leaves the app has the JSON
 *   envelope produced by AppError
 * - Panics → 500 (used by CatchPanicLayer in middleware::http)
 * - Non-JSON error responses (axum rejections, 405, 413 ...) are rewritten,
 *   keeping status and headers (Allow, WWW-Authenticate ...)
 * - Request body limit (1 MiB), applied inside the rewriter so its
 *   plain-text 413 gets the envelope too
 * - Unknown routes → JSON 404 (Router fallback)
 */
use std::any::Any;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use tower_http::limit::RequestBodyLimitLayer;

use crate::error::AppError;

pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

pub fn apply(router: Router) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn(normalize_errors))
}

pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "handler panicked");
    AppError::Internal.into_response()
}

pub async fn fallback(uri: Uri) -> AppError {
    AppError::not_found(format!("route {}", uri.path()))
}

async fn normalize_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    if status.is_server_error() {
        tracing::error!(%method, path = %path, status = status.as_u16(), "request failed");
    } else {
        tracing::debug!(%method, path = %path, status = status.as_u16(), "request rejected");
    }

    if is_json(response.headers().get(header::CONTENT_TYPE)) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = match axum::body::to_bytes(body, 4 * 1024).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).into_owned(),
        _ => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_ascii_lowercase(),
    };

    let mut rewritten = AppError::from_status(status, message).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().append(name.clone(), value.clone());
        }
    }
    rewritten
}

fn is_json(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            let v = v.to_ascii_lowercase();
            v.starts_with("application/json") || v.contains("+json")
        })
}
