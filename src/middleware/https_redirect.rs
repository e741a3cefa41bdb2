//! HTTP → HTTPS redirection.
//!
//! TLS is terminated in front of this process, so the original scheme is read
//! from `X-Forwarded-Proto`. Redirection is only active when `HTTPS_PORT` is
//! configured; without a known port there is nowhere to redirect to.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

pub fn apply(router: Router, https_port: Option<u16>) -> Router {
    match https_port {
        Some(port) => router.layer(middleware::from_fn_with_state(port, redirect_middleware)),
        None => router,
    }
}

async fn redirect_middleware(
    State(https_port): State<u16>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !is_forwarded_http(req.headers()) {
        return next.run(req).await;
    }

    match https_location(req.headers(), req.uri(), https_port) {
        Some(location) => {
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
        }
        None => next.run(req).await,
    }
}

fn is_forwarded_http(headers: &HeaderMap) -> bool {
    headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("http"))
}

pub fn https_location(headers: &HeaderMap, uri: &Uri, https_port: u16) -> Option<HeaderValue> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    // strip any port from the Host header
    let host = match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
                && (name.ends_with(']') || !name.contains(':')) =>
        {
            name
        }
        _ => host,
    };
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let location = if https_port == 443 {
        format!("https://{}{}", host, path_and_query)
    } else {
        format!("https://{}:{}{}", host, https_port, path_and_query)
    };
    HeaderValue::from_str(&location).ok()
}
