/*
 * Responsibility
 * - v1 URL layout
 * - Which routes need which authorization policy (route_layer per group)
 */
use axum::{Router, routing::get};

use crate::middleware::auth::authorize;
use crate::services::auth::policy::Policy;
use crate::state::AppState;

use crate::api::v1::handlers::{admin::admin_status, me::me, version::version};

pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/version", get(version));

    let authenticated = authorize::require(
        Router::new().route("/me", get(me)),
        Policy::authenticated(),
    );

    let admin = authorize::require(
        Router::new().route("/admin/status", get(admin_status)),
        Policy::require_administrator_role(),
    );

    public.merge(authenticated).merge(admin)
}
