#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use ccg_webapi::app::build_router;
use ccg_webapi::config::Config;
use ccg_webapi::state::AppState;

pub const SECRET: &str = "test-secret-test-secret-test-secret!";
pub const ISSUER: &str = "ccg-tests";
pub const ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

pub fn config_with(extra: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = HashMap::from([
        ("JWT_SECRET".to_string(), SECRET.to_string()),
        ("JWT_ISSUER".to_string(), ISSUER.to_string()),
        ("JWT_AUDIENCE".to_string(), "ccg-clients".to_string()),
    ]);
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| env.get(key).cloned()).expect("test config")
}

pub fn app() -> axum::Router {
    app_with(&[])
}

pub fn app_with(extra: &[(&str, &str)]) -> axum::Router {
    build_router(AppState::new(config_with(extra)))
}

pub fn sign(claims: Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign token")
}

/// A valid token for `subject` carrying `roles`.
pub fn token(subject: &str, roles: &[&str]) -> String {
    sign(json!({
        "iss": ISSUER,
        "nameid": subject,
        ROLE_CLAIM: roles,
    }))
}

pub async fn send(app: &axum::Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("infallible router")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}
