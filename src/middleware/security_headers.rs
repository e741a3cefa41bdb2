//! Security-related response headers for browser clients.
//!
//! This middleware is intended to be applied at the Router level
//! (not inside individual handlers).
//!
//! Responsibility:
//! - HSTS (production only, so local http:// development is not pinned)
//! - Clickjacking protection
//! - MIME sniffing protection
//! - Referrer leakage control

use axum::Router;
use axum::http::header::{self, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;

pub fn hsts_value(max_age_seconds: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("max-age={}", max_age_seconds)).ok()
}

/// Apply common security headers to all responses.
pub fn apply(router: Router, config: &Config) -> Router {
    let router = router
        // Clickjacking protection
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        // Prevent MIME sniffing
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        // Limit referrer leakage
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ));

    match hsts_value(config.hsts_max_age_seconds) {
        Some(hsts) if config.app_env.is_production() => router.layer(
            SetResponseHeaderLayer::if_not_present(header::STRICT_TRANSPORT_SECURITY, hsts),
        ),
        _ => router,
    }
}
