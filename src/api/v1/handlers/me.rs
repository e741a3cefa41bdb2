/*
 * Responsibility
 * - GET /api/v1/me: echo the authenticated principal
 */
use axum::Json;

use crate::api::extractors::AuthCtxExtractor;
use crate::api::v1::dto::me::MeResponse;
use crate::error::ErrorResponse;

#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Authenticated principal", body = MeResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
    ),
    security(
        ("Bearer" = []),
        ("access_token" = []),
    ),
    tag = "auth"
)]
pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(&ctx))
}
