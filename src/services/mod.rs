/*
 * Responsibility
 * - Domain-side services shared through AppState (auth, response cache)
 * - No axum Router wiring here
 */
pub mod auth;
pub mod cache;
