//! Challenge nonce generation.
//!
//! Nonces are decimal strings drawn uniformly from `[0, 2^130 - 1)`, which is
//! comfortably above 128 bits of entropy. Randomness comes straight from the
//! operating system through a fallible API so that an unavailable entropy
//! source becomes an error, not a panic.

use crate::error::AppError;
use crate::models::Nonce;
use num_bigint::BigUint;
use rand::{rngs::OsRng, TryRngCore};
use std::sync::LazyLock;

/// Exclusive upper bound for nonce values: `2^130 - 1`.
static NONCE_BOUND: LazyLock<BigUint> =
    LazyLock::new(|| (BigUint::from(1u8) << 130u32) - BigUint::from(1u8));

/// Bytes needed to hold a 130-bit value.
const NONCE_BYTES: usize = 17;

/// Mask applied to the leading byte so the draw covers exactly 130 bits.
const TOP_BYTE_MASK: u8 = 0b0000_0011;

/// Error type for nonce generation.
#[derive(Debug, thiserror::Error)]
pub enum NonceError {
    #[error("Random source unavailable: {0}")]
    RandomSource(String),
}

impl From<NonceError> for AppError {
    fn from(err: NonceError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Source of fresh challenge nonces.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> Result<Nonce, NonceError>;
}

/// Nonce source backed by the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn next_nonce(&self) -> Result<Nonce, NonceError> {
        generate_nonce()
    }
}

/// Generate a challenge nonce from the OS random source.
///
/// Draws 130 random bits and rejects the single value equal to the bound, so
/// every value in range is equally likely.
pub fn generate_nonce() -> Result<Nonce, NonceError> {
    let mut bytes = [0u8; NONCE_BYTES];
    loop {
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| NonceError::RandomSource(e.to_string()))?;
        bytes[0] &= TOP_BYTE_MASK;

        let value = BigUint::from_bytes_be(&bytes);
        if value < *NONCE_BOUND {
            return Ok(Nonce(value.to_str_radix(10)));
        }
    }
}
