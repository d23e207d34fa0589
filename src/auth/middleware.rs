//! Shared state and the bearer-token extractor.

use crate::auth::nonce::{NonceSource, OsNonceSource};
use crate::auth::protocol;
use crate::auth::token::TokenProvider;
use crate::config::Config;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::storage::UserRegistry;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Application state shared across handlers.
///
/// Holds the one registry instance for the life of the process.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<UserRegistry>,
    pub tokens: Arc<TokenProvider>,
    pub nonces: Arc<dyn NonceSource>,
}

impl AppState {
    /// Build state with an empty registry and the OS nonce source.
    pub fn from_config(config: &Config) -> Self {
        Self {
            registry: Arc::new(UserRegistry::new()),
            tokens: Arc::new(TokenProvider::new(
                config.jwt_secret.as_bytes(),
                &config.jwt_issuer,
                config.token_ttl_secs,
            )),
            nonces: Arc::new(OsNonceSource),
        }
    }
}

/// Authenticated user extractor.
///
/// Extracts the token from the `Authorization: Bearer {token}` header and
/// resolves it to the user's current record. Returns 401 Unauthorized if the
/// header is missing, the token is invalid or expired, or the account is gone.
#[derive(Debug)]
pub struct AuthenticatedUser(pub UserRecord);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        // Parse Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?;

        protocol::authorize(state, token).map(AuthenticatedUser)
    }
}
