//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! `Address` and `Nonce` can only be built through validation, so any value
//! of those types that reaches the registry is already well-formed.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Types
// ============================================================================

/// Number of hex digits in an account address (20 bytes).
pub const ADDRESS_HEX_LEN: usize = 40;

/// Ethereum-style account address, normalized to lowercase.
///
/// Accepted input is `0x` followed by exactly 40 hex digits in any case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let digits = input
            .strip_prefix("0x")
            .ok_or_else(|| AppError::BadRequest("Invalid address".to_string()))?;

        if digits.len() != ADDRESS_HEX_LEN || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::BadRequest("Invalid address".to_string()));
        }

        Ok(Address(input.to_ascii_lowercase()))
    }

    /// Build an address from the 20 raw bytes of an account.
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Address(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

/// One-time challenge: a non-empty string of ASCII decimal digits.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Nonce(pub(crate) String);

impl Nonce {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::BadRequest("Invalid nonce".to_string()));
        }
        Ok(Nonce(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Nonces stay out of logs; only the length is shown.
impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce(<{} digits>)", self.0.len())
    }
}

/// A registered account and the nonce it must sign next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub address: Address,
    pub nonce: Nonce,
}

// ============================================================================
// Auth Models
// ============================================================================

/// Request to register an address.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub address: String,
}

/// Response containing the nonce to sign.
///
/// The capitalized key is what existing wallet front-ends read.
#[derive(Debug, Serialize)]
pub struct NonceResponse {
    #[serde(rename = "Nonce")]
    pub nonce: Nonce,
}

/// Request to sign in with a signed nonce.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub address: String,
    pub nonce: String,
    pub sig: String, // hex, 65 bytes
}

/// Response after successful sign-in.
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    #[serde(rename = "access")]
    pub access_token: String,
}

/// Greeting returned from the protected endpoint.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub msg: String,
}
