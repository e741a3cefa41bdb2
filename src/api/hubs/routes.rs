use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth::authorize;
use crate::services::auth::policy::Policy;
use crate::state::AppState;

use super::handlers::{connect, negotiate};

pub fn routes() -> Router<AppState> {
    authorize::require(
        Router::new()
            .route("/{hub}", get(connect))
            .route("/{hub}/negotiate", post(negotiate)),
        Policy::authenticated(),
    )
}
