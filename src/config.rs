use crate::auth::token::MAX_TOKEN_TTL_SECS;
use std::env;
use std::net::SocketAddr;
use zeroize::Zeroizing;

/// Minimum HMAC secret length, matching the HS256 output size.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct Config {
    // Token signing
    pub jwt_secret: Zeroizing<String>,
    pub jwt_issuer: String,
    pub token_ttl_secs: u64,

    // Server
    pub bind_addr: SocketAddr,

    // Limits
    pub max_body_bytes: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bind_addr", &self.bind_addr)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Token signing - JWT_SECRET is required
        let jwt_secret = Zeroizing::new(
            env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?,
        );

        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                format!(
                    "must be at least {} bytes, got {}",
                    MIN_SECRET_BYTES,
                    jwt_secret.len()
                ),
            ));
        }

        let jwt_issuer =
            env::var("JWT_ISSUER").unwrap_or_else(|_| "awesome-metamask-login".to_string());
        if jwt_issuer.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_ISSUER".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        let token_ttl_secs: u64 = parse_env_or_default("TOKEN_TTL_SECS", 900)?;
        if token_ttl_secs == 0 || token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_SECS".to_string(),
                format!("must be between 1 and {}", MAX_TOKEN_TTL_SECS),
            ));
        }

        // Server
        let bind_addr_str =
            env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8001".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        // Limits
        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 16_384)?;

        Ok(Config {
            jwt_secret,
            jwt_issuer,
            token_ttl_secs,
            bind_addr,
            max_body_bytes,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
