/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Cheap to clone (everything inside is Arc)
 * - Built once at startup from the immutable Config
 */
use std::sync::Arc;

use crate::config::Config;
use crate::services::{auth::AuthService, cache::ResponseCache};

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub response_cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let auth = Arc::new(AuthService::new(&config.jwt));
        let response_cache = Arc::new(ResponseCache::new(config.response_cache));
        Self {
            config: Arc::new(config),
            auth,
            response_cache,
        }
    }
}
