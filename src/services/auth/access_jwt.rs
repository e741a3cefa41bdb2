use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::{error::Error as StdError, fmt};

use crate::config::JwtTokenConfig;

/// Inbound claim names are kept raw, so both the long WS-* URIs emitted by
/// .NET-style issuers and the short JWT names are recognised.
pub const NAME_IDENTIFIER_CLAIMS: &[&str] = &[
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
    "nameid",
    "sub",
];
pub const ROLE_CLAIMS: &[&str] = &[
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
    "role",
    "roles",
];

// Errors returned by access-token verification.
#[derive(Debug)]
pub enum AccessJwtError {
    Jwt(jsonwebtoken::errors::Error),
    InvalidClaim(&'static str),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::InvalidClaim(name) => write!(f, "invalid '{}' claim", name),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// Claims after signature/issuer checks, mapped to identity and role fields.
#[derive(Debug, Clone)]
pub struct VerifiedAccessToken {
    pub subject: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub claims: Map<String, Value>,
}

/// Symmetric-key (HMAC) access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(config: &JwtTokenConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.leeway = config.clock_skew_seconds;

        if config.validate_audience {
            validation.set_audience(&[config.audience.as_str()]);
        } else {
            validation.validate_aud = false;
        }

        let mut required: HashSet<String> = HashSet::from(["iss".to_string()]);
        if config.validate_lifetime {
            required.insert("exp".to_string());
        } else {
            validation.validate_exp = false;
            validation.validate_nbf = false;
        }
        validation.required_spec_claims = required;

        Self {
            decoding_key,
            validation,
        }
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<Map<String, Value>, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify, then map claims into the identity/role view used by handlers.
    pub fn verify_verified(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let claims = self.verify(token)?;

        let subject = NAME_IDENTIFIER_CLAIMS
            .iter()
            .find_map(|name| claims.get(*name))
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(AccessJwtError::InvalidClaim("nameid")),
            })
            .transpose()?;

        let mut roles: Vec<String> = Vec::new();
        let mut push_role = |role: &str| {
            if !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        };
        for name in ROLE_CLAIMS {
            match claims.get(*name) {
                None => {}
                Some(Value::String(role)) => push_role(role),
                Some(Value::Array(values)) => {
                    for value in values {
                        let Value::String(role) = value else {
                            return Err(AccessJwtError::InvalidClaim("role"));
                        };
                        push_role(role);
                    }
                }
                Some(_) => return Err(AccessJwtError::InvalidClaim("role")),
            }
        }

        let expires_at = claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single());

        Ok(VerifiedAccessToken {
            subject,
            roles,
            expires_at,
            claims,
        })
    }
}
