//! # OpenAPI document
//!
//! Assembles the utoipa-documented routes into one OpenAPI 3.1 document,
//! served at `/swagger/v1/swagger.json`.
//!
//! Two security schemes are published, matching where the access middleware
//! looks for a credential: `Bearer` (the `Authorization` header) and
//! `access_token` (the custom header). Only protected operations reference
//! them.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;
use crate::version::{API_VERSION, SOLUTION_NAME};

pub const DOCUMENT_PATH: &str = "/swagger/v1/swagger.json";
pub const BEARER_SCHEME: &str = "Bearer";
pub const ACCESS_TOKEN_SCHEME: &str = "access_token";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Enter JWT Bearer token **_only_**"))
                    .build(),
            ),
        );
        components.add_security_scheme(
            ACCESS_TOKEN_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "access_token",
                "JWT in the `access_token` header (also accepted as a cookie)",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::v1::handlers::health::health,
        crate::api::v1::handlers::version::version,
        crate::api::v1::handlers::me::me,
        crate::api::v1::handlers::admin::admin_status,
        crate::api::hubs::handlers::negotiate,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::error::ErrorBody,
            crate::api::v1::dto::version::VersionResponse,
            crate::api::v1::dto::me::MeResponse,
            crate::api::v1::dto::admin::AdminStatusResponse,
            crate::api::hubs::dto::NegotiateResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "meta", description = "Solution and API version"),
        (name = "auth", description = "Authenticated principal"),
        (name = "admin", description = "Administration (RequireAdministratorRole)"),
        (name = "hubs", description = "Long-lived hub connections"),
    )
)]
pub struct ApiDoc;

/// The published document, titled with the solution name and API version.
pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = SOLUTION_NAME.to_string();
    doc.info.version = API_VERSION.to_string();
    doc
}

pub fn router() -> Router<AppState> {
    Router::new().route(DOCUMENT_PATH, get(swagger_json))
}

async fn swagger_json() -> Json<utoipa::openapi::OpenApi> {
    Json(api_doc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_is_titled_and_versioned() {
        let doc = api_doc();
        assert_eq!(doc.info.title, SOLUTION_NAME);
        assert_eq!(doc.info.version, API_VERSION);
    }

    #[test]
    fn security_schemes_are_registered() {
        let json = serde_json::to_value(api_doc()).unwrap();
        let schemes = &json["components"]["securitySchemes"];
        assert_eq!(schemes[BEARER_SCHEME]["scheme"], "bearer");
        assert_eq!(schemes[BEARER_SCHEME]["bearerFormat"], "JWT");
        assert_eq!(schemes[ACCESS_TOKEN_SCHEME]["in"], "header");
        assert_eq!(schemes[ACCESS_TOKEN_SCHEME]["name"], "access_token");
    }

    #[test]
    fn only_protected_operations_require_security() {
        let json = serde_json::to_value(api_doc()).unwrap();
        let paths = &json["paths"];
        assert!(paths["/health"]["get"]["security"].is_null());
        assert!(paths["/api/v1/version"]["get"]["security"].is_null());
        assert!(paths["/api/v1/me"]["get"]["security"].is_array());
        assert!(paths["/api/v1/admin/status"]["get"]["responses"]["403"].is_object());
        assert!(paths["/hubs/{hub}/negotiate"]["post"]["security"].is_array());
    }
}
