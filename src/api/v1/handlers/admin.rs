/*
 * Responsibility
 * - GET /api/v1/admin/status (RequireAdministratorRole)
 */
use axum::{Json, extract::State};

use crate::api::extractors::AuthCtxExtractor;
use crate::api::v1::dto::admin::AdminStatusResponse;
use crate::error::ErrorResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/admin/status",
    responses(
        (status = 200, description = "Host status", body = AdminStatusResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Caller lacks the Admin role", body = ErrorResponse),
    ),
    security(
        ("Bearer" = []),
        ("access_token" = []),
    ),
    tag = "admin"
)]
pub async fn admin_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Json<AdminStatusResponse> {
    Json(AdminStatusResponse {
        status: "ok".to_string(),
        administrator: ctx.subject,
        cached_responses: state.response_cache.len(),
        cached_bytes: state.response_cache.size(),
    })
}
