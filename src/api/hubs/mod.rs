/*!
 * Hub endpoints (long-lived connections)
 *
 * Responsibility:
 * - `/hubs/{hub}/negotiate` + `/hubs/{hub}` WebSocket
 * - Browsers cannot set headers on WebSocket connections, so these are the
 *   only paths where `?access_token=` is honoured
 */
pub mod dto;
pub mod handlers;
mod routes;

pub use dto::NegotiateResponse;
pub use handlers::{KNOWN_HUBS, connect, negotiate};
pub use routes::routes;
