use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    pub connection_id: Uuid,
    pub hub: String,
    /// Relative URL to open; the client appends `?access_token=...`.
    pub url: String,
    pub available_transports: Vec<String>,
}
