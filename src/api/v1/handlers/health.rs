/*
 * Responsibility
 * - GET /health (liveness, no authentication)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up"),
    ),
    tag = "health"
)]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
