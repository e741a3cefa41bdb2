/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the authenticated request context (AuthCtx) to handlers
 * - Keep the axum-specific extraction in core and the plain types in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 * - AuthFailure
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::{AuthCtx, AuthFailure};
