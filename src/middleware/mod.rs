/*
 * Responsibility
 * - Public interface of the middleware layers; each module exposes an
 *   `apply(router, ...)` that app.rs stacks in order
 */
pub mod auth;
pub mod cors;
pub mod error_handler;
pub mod http;
pub mod https_redirect;
pub mod response_cache;
pub mod security_headers;
