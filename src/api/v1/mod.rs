/*
 * Responsibility
 * - v1 public entry point (re-exports routes())
 */
pub mod dto;
pub mod handlers;
mod routes;

pub use routes::routes;
