/*
 * Responsibility
 * - Load settings from the environment (.env is read first via dotenvy)
 * - Validate them once at startup; a missing or malformed key fails the boot
 * - The resulting Config is immutable and shared by reference afterwards
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// HS256 needs at least a 256-bit key.
pub const MIN_SECRET_LEN: usize = 32;

/// Settings for access-token validation.
///
/// `validate_audience` and `validate_lifetime` default to `false`. Both are
/// surfaced here so a deployment has to opt in explicitly; `app::run` warns
/// at startup whenever either is off.
#[derive(Clone)]
pub struct JwtTokenConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub validate_audience: bool,
    pub validate_lifetime: bool,
    pub clock_skew_seconds: u64,
}

impl fmt::Debug for JwtTokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtTokenConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("validate_audience", &self.validate_audience)
            .field("validate_lifetime", &self.validate_lifetime)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCacheConfig {
    pub enabled: bool,
    pub max_body_bytes: usize,
    pub size_limit_bytes: usize,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: 1024 * 1024,
            size_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub jwt: JwtTokenConfig,

    pub cors_allowed_origins: Vec<String>,
    pub response_cache: ResponseCacheConfig,

    pub https_port: Option<u16>,
    pub hsts_max_age_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a Config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if !secret.is_ascii() || secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let issuer = lookup("JWT_ISSUER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_ISSUER"))?;

        let audience = lookup("JWT_AUDIENCE")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let validate_audience = parse_bool_or(&lookup, "JWT_VALIDATE_AUDIENCE", false)?;
        if validate_audience && audience.is_empty() {
            return Err(ConfigError::Missing("JWT_AUDIENCE"));
        }

        let validate_lifetime = parse_bool_or(&lookup, "JWT_VALIDATE_LIFETIME", false)?;
        let clock_skew_seconds = parse_or(&lookup, "JWT_CLOCK_SKEW_SECONDS", 60)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let defaults = ResponseCacheConfig::default();
        let response_cache = ResponseCacheConfig {
            enabled: parse_bool_or(&lookup, "RESPONSE_CACHE_ENABLED", defaults.enabled)?,
            max_body_bytes: parse_or(
                &lookup,
                "RESPONSE_CACHE_MAX_BODY_BYTES",
                defaults.max_body_bytes,
            )?,
            size_limit_bytes: parse_or(
                &lookup,
                "RESPONSE_CACHE_SIZE_LIMIT_BYTES",
                defaults.size_limit_bytes,
            )?,
        };

        let https_port = match lookup("HTTPS_PORT").filter(|s| !s.trim().is_empty()) {
            Some(v) => Some(
                v.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::Invalid("HTTPS_PORT"))?,
            ),
            None => None,
        };

        let hsts_max_age_seconds = parse_or(&lookup, "HSTS_MAX_AGE_SECONDS", 2_592_000)?; // 30 days

        Ok(Self {
            addr,
            app_env,
            jwt: JwtTokenConfig {
                secret,
                issuer,
                audience,
                validate_audience,
                validate_lifetime,
                clock_skew_seconds,
            },
            cors_allowed_origins,
            response_cache,
            https_port,
            hsts_max_age_seconds,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|s| !s.trim().is_empty()) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(v) = lookup(key).filter(|s| !s.trim().is_empty()) else {
        return Ok(default);
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key)),
    }
}
