//! CORS policy for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Native apps and server-to-server calls are not
//!   restricted by CORS.
//! - This middleware should be applied at the Router level (not inside handlers).
//!
//! Policy:
//! - No allowlist configured: `AllowAll` (any origin, any method, any header),
//!   WITHOUT credentials.
//! - Allowlist configured (comma-separated env var): exact-match origins only,
//!   WITHOUT credentials.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;
use crate::services::auth::token_source::ACCESS_TOKEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    AllowAll,
    Allowlist(Vec<String>),
}

impl CorsPolicy {
    pub fn from_config(config: &Config) -> Self {
        if config.cors_allowed_origins.is_empty() {
            Self::AllowAll
        } else {
            Self::Allowlist(config.cors_allowed_origins.clone())
        }
    }

    pub fn layer(&self) -> CorsLayer {
        match self {
            CorsPolicy::AllowAll => CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
            CorsPolicy::Allowlist(origins) => {
                let allowed: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|s| HeaderValue::from_str(s).ok())
                    .collect();

                let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
                    allowed.iter().any(|v| v == origin)
                });

                CorsLayer::new()
                    .allow_origin(allow_origin)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::PATCH,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([
                        header::AUTHORIZATION,
                        header::CONTENT_TYPE,
                        header::ACCEPT,
                        HeaderName::from_static(ACCESS_TOKEN),
                        HeaderName::from_static("x-request-id"),
                    ])
            }
        }
        .max_age(std::time::Duration::from_secs(60 * 10))
    }
}

/// Apply CORS policy to the given Router.
///
/// IMPORTANT:
/// - Do not combine wildcard origin (`Any`) with `allow_credentials(true)`.
pub fn apply(router: Router, config: &Config) -> Router {
    let policy = CorsPolicy::from_config(config);
    tracing::debug!(?policy, "cors policy");
    router.layer(policy.layer())
}
