/*
 * Responsibility
 * - The "authenticated context" type seen by handlers
 * - The access middleware validates and stores it in request extensions;
 *   handlers only ever receive this type
 *
 * Notes
 * - Token resolution and JWT validation live in middleware/services
 */

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::services::auth::access_jwt::VerifiedAccessToken;
use crate::services::auth::token_source::TokenSource;

/// Context attached to a request carrying a valid access token.
///
/// - `subject` is the name identifier claim (absent if the token has none)
/// - `token` is the raw credential, kept so handlers can forward it
/// - `source` records where the credential was found (for logs and /me)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub subject: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub claims: Map<String, Value>,
    pub token: String,
    pub source: TokenSource,
}

impl AuthCtx {
    pub fn new(verified: VerifiedAccessToken, token: String, source: TokenSource) -> Self {
        Self {
            subject: verified.subject,
            roles: verified.roles,
            expires_at: verified.expires_at,
            claims: verified.claims,
            token,
            source,
        }
    }

    /// Role comparison is exact (case-sensitive).
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Marker left in extensions when a credential was presented but rejected.
/// Turns the later 401 challenge into `error="invalid_token"`.
#[derive(Debug, Clone, Copy)]
pub struct AuthFailure;
