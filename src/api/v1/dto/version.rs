use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub solution: String,
    pub api_version: String,
    pub build: String,
}
