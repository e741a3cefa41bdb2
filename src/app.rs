/*
 * Responsibility
 * - Load Config → build AppState → assemble Router
 * - Stack middleware in order (outermost first):
 *   request id / trace / timeout → panic catcher → compression
 *   → security headers (HSTS) → HTTPS redirect → CORS → error normalizer
 *   → body limit → authentication → response cache → routes (+ per-route authorization)
 * - Start with axum::serve(), stop on Ctrl-C
 */
use std::{panic, process};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, JwtTokenConfig};
use crate::middleware;
use crate::openapi;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,ccg_webapi=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost
        // (stderr can be hidden depending on how the process is launched).
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        // Production: default behaviour; the panic catcher turns it into a 500.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

/// Log every validation check that is switched off.
fn warn_on_relaxed_validation(jwt: &JwtTokenConfig) {
    if !jwt.validate_audience {
        tracing::warn!(
            audience = %jwt.audience,
            "JWT audience validation is disabled (JWT_VALIDATE_AUDIENCE=false): tokens for any audience are accepted"
        );
    }
    if !jwt.validate_lifetime {
        tracing::warn!(
            "JWT lifetime validation is disabled (JWT_VALIDATE_LIFETIME=false): expired tokens are accepted"
        );
    }
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    warn_on_relaxed_validation(&config.jwt);

    let addr = config.addr;
    let state = AppState::new(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes())
        .nest("/hubs", api::hubs::routes())
        .merge(openapi::router())
        .fallback(middleware::error_handler::fallback)
        .with_state(state.clone());

    let router = middleware::response_cache::apply(router, state.response_cache.clone());
    let router = middleware::auth::access::apply(router, state);
    let router = middleware::error_handler::apply(router);
    let router = middleware::cors::apply(router, &config);
    let router = middleware::https_redirect::apply(router, config.https_port);
    let router = middleware::security_headers::apply(router, &config);
    middleware::http::apply(router)
}
