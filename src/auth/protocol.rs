//! Register, nonce lookup, sign-in and authorization.
//!
//! A sign-in moves through these checks in order, stopping at the first
//! failure:
//!
//! 1. input validation (`BadRequest`, nothing touched)
//! 2. registry lookup (`NotFound`)
//! 3. submitted nonce equals the stored one (`Unauthorized`)
//! 4. public key recovery from the personal-sign hash (`SignatureFormat`)
//! 5. recovered address equals the stored one (`Unauthorized`)
//! 6. nonce rotation commits (`Internal` / `Unauthorized`)
//!
//! Only step 6 makes a sign-in succeed. It swaps the nonce checked in step 3
//! for a fresh one with a compare-and-swap, so a nonce authenticates at most
//! once even when several requests carrying it race each other.

use crate::auth::middleware::AppState;
use crate::auth::verify::recover_address;
use crate::error::AppError;
use crate::models::{Address, Nonce, SigninRequest, UserRecord};

/// Validated sign-in input.
#[derive(Debug)]
pub struct Credentials {
    pub address: Address,
    pub nonce: Nonce,
    pub signature: String,
}

impl Credentials {
    /// Check the shape of a sign-in request without touching any state.
    pub fn parse(req: &SigninRequest) -> Result<Self, AppError> {
        let address = Address::parse(&req.address)?;
        let nonce = Nonce::parse(&req.nonce)?;
        if req.sig.is_empty() {
            return Err(AppError::BadRequest("Signature is missing".to_string()));
        }

        Ok(Credentials {
            address,
            nonce,
            signature: req.sig.clone(),
        })
    }
}

/// Register `address` with a fresh nonce.
///
/// # Errors
/// * `AppError::BadRequest` for a malformed address
/// * `AppError::Conflict` if the address is already registered
/// * `AppError::Internal` if no nonce could be generated
pub fn register(state: &AppState, address: &str) -> Result<UserRecord, AppError> {
    let address = Address::parse(address)?;
    let nonce = state.nonces.next_nonce()?;

    state
        .registry
        .create_if_absent(address.clone(), nonce.clone())?;

    tracing::info!(action = "user_registered", address = %address, "New user registered");

    Ok(UserRecord { address, nonce })
}

/// Current nonce for `address`.
pub fn get_nonce(state: &AppState, address: &str) -> Result<Nonce, AppError> {
    let address = Address::parse(address)?;
    state.registry.get(&address).map(|user| user.nonce)
}

/// Run checks 2–6 for already-validated credentials.
///
/// On success returns the user record holding its new nonce.
pub fn authenticate(state: &AppState, creds: &Credentials) -> Result<UserRecord, AppError> {
    let user = state.registry.get(&creds.address)?;

    if user.nonce != creds.nonce {
        return Err(AppError::Unauthorized("Nonce mismatch".to_string()));
    }

    // What the wallet signed is the decimal nonce string itself.
    let recovered = recover_address(creds.nonce.as_str().as_bytes(), &creds.signature)?;
    if recovered != user.address {
        return Err(AppError::Unauthorized(
            "Signature does not match address".to_string(),
        ));
    }

    // If this fails the stored nonce is left as it was and the attempt fails.
    let fresh = state.nonces.next_nonce()?;
    state
        .registry
        .rotate_nonce(&user.address, &user.nonce, fresh.clone())?;

    tracing::debug!(action = "nonce_rotated", address = %user.address, "Nonce rotated");

    Ok(UserRecord {
        address: user.address,
        nonce: fresh,
    })
}

/// Validate a sign-in request, authenticate it and issue an access token.
///
/// An unknown address is reported as `Unauthorized`, like every other
/// authentication failure.
pub fn sign_in(state: &AppState, req: &SigninRequest) -> Result<String, AppError> {
    let creds = Credentials::parse(req)?;

    let user = match authenticate(state, &creds) {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => {
            tracing::warn!(action = "auth_failed", address = %creds.address, reason = "unknown address", "Sign-in rejected");
            return Err(AppError::Unauthorized("Unknown address".to_string()));
        }
        Err(err @ AppError::Unauthorized(_)) => {
            tracing::warn!(action = "auth_failed", address = %creds.address, reason = %err, "Sign-in rejected");
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    let token = state.tokens.issue(user.address.as_str())?;

    tracing::info!(action = "auth_success", address = %user.address, "User authenticated");

    Ok(token)
}

/// Resolve a bearer token to the current record of its subject.
pub fn authorize(state: &AppState, token: &str) -> Result<UserRecord, AppError> {
    let claims = state.tokens.verify(token)?;

    let address = Address::parse(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

    state.registry.get(&address).map_err(|e| match e {
        AppError::NotFound(_) => AppError::Unauthorized("Token subject not registered".to_string()),
        other => other,
    })
}
