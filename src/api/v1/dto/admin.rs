use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminStatusResponse {
    pub status: String,
    pub administrator: Option<String>,
    pub cached_responses: usize,
    pub cached_bytes: usize,
}
