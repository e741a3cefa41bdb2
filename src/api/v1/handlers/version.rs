/*
 * Responsibility
 * - GET /api/v1/version
 * - Public and cacheable: marks itself `Cache-Control: public` so the
 *   response cache can serve repeats
 */
use axum::{
    Json,
    http::{HeaderValue, header},
    response::IntoResponse,
};

use crate::api::v1::dto::version::VersionResponse;
use crate::version::{API_VERSION, BUILD_VERSION, SOLUTION_NAME};

pub const VERSION_CACHE_CONTROL: &str = "public, max-age=60";

#[utoipa::path(
    get,
    path = "/api/v1/version",
    responses(
        (status = 200, description = "Solution name and API version", body = VersionResponse),
    ),
    tag = "meta"
)]
pub async fn version() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(VERSION_CACHE_CONTROL))],
        Json(VersionResponse {
            solution: SOLUTION_NAME.to_string(),
            api_version: API_VERSION.to_string(),
            build: BUILD_VERSION.to_string(),
        }),
    )
}
