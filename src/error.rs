/*
 * Responsibility
 * - Shared AppError definition
 * - IntoResponse (HTTP status / JSON error body / WWW-Authenticate challenge)
 * - Conversions from config and token errors
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::ConfigError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized { invalid_token: bool },
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {resource}")]
    NotFound { resource: String },
    #[error("request timed out")]
    RequestTimeout,
    #[error("no cached response available")]
    GatewayTimeout,
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(invalid_token: bool) -> Self {
        Self::Unauthorized { invalid_token }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Wrap an arbitrary error status (e.g. an axum rejection) in the JSON envelope.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Status { status, .. } => *status,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Stable machine-readable code for a status.
pub fn status_code_name(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason.to_ascii_uppercase().replace([' ', '-'], "_"),
        None => format!("HTTP_{}", status.as_u16()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::BadRequest { code, message } => (code.to_string(), message.clone()),
            AppError::NotFound { resource } => {
                ("NOT_FOUND".to_string(), format!("{resource} not found."))
            }
            AppError::Internal => (
                "INTERNAL_SERVER_ERROR".to_string(),
                "internal server error".to_string(),
            ),
            other => (status_code_name(status), other.to_string()),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();

        if let AppError::Unauthorized { invalid_token } = self {
            let challenge = if invalid_token {
                HeaderValue::from_static("Bearer error=\"invalid_token\"")
            } else {
                HeaderValue::from_static("Bearer")
            };
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }

        response
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        tracing::error!(error = %e, "configuration error");
        AppError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response = AppError::unauthorized(false).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let response = AppError::unauthorized(true).into_response();
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Bearer error=\"invalid_token\""
        );
    }

    #[test]
    fn status_codes_have_stable_names() {
        assert_eq!(status_code_name(StatusCode::METHOD_NOT_ALLOWED), "METHOD_NOT_ALLOWED");
        assert_eq!(status_code_name(StatusCode::PAYLOAD_TOO_LARGE), "PAYLOAD_TOO_LARGE");
        assert_eq!(status_code_name(StatusCode::from_u16(599).unwrap()), "HTTP_599");
    }

    #[test]
    fn forbidden_has_no_challenge() {
        let response = AppError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
