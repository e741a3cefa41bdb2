use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::extractors::AuthCtx;

/// The caller as seen by the API after authentication.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub subject: Option<String>,
    pub roles: Vec<String>,
    /// Where the credential was found: query, header, cookie or authorization.
    pub token_source: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&AuthCtx> for MeResponse {
    fn from(ctx: &AuthCtx) -> Self {
        Self {
            subject: ctx.subject.clone(),
            roles: ctx.roles.clone(),
            token_source: ctx.source.as_str().to_string(),
            expires_at: ctx.expires_at,
        }
    }
}
