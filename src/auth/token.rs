//! Stateless bearer tokens.
//!
//! Tokens are HS256 JWTs carrying `{iss, sub, iat, exp}`. Nothing is stored
//! server-side: a token is valid exactly when its MAC checks out under the
//! configured secret, the issuer matches and `exp` has not passed.

use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The only algorithm tokens are signed or accepted with.
const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Upper bound on token lifetime (one year).
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (account address)
    pub sub: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a shared HMAC secret.
pub struct TokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
    validation: Validation,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenProvider {
    /// Build a provider. `ttl_secs` is clamped to `MAX_TOKEN_TTL_SECS`.
    pub fn new(secret: &[u8], issuer: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0; // No clock skew tolerance
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.to_string(),
            ttl: Duration::seconds(ttl_secs.min(MAX_TOKEN_TTL_SECS) as i64),
            validation,
        }
    }

    /// Create a token for `subject`, valid from now for the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        self.issue_at(subject, Utc::now())
    }

    pub(crate) fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(TOKEN_ALGORITHM),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Validate and decode a token.
    ///
    /// Every failure (bad MAC, other algorithm, wrong issuer, expired,
    /// garbage) comes back as the same `AppError::Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(action = "token_rejected", kind = ?e.kind(), "Token rejected");
                AppError::Unauthorized("Invalid token".to_string())
            })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const ISSUER: &str = "walletauth-test";
    const SUBJECT: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    fn provider() -> TokenProvider {
        TokenProvider::new(SECRET, ISSUER, 900)
    }

    fn b64(json: serde_json::Value) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(json.to_string())
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = provider();
        let token = tokens.issue(SUBJECT).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, SUBJECT);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_header_is_hs256() {
        let token = provider().issue(SUBJECT).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = provider();
        let token = tokens
            .issue_at(SUBJECT, Utc::now() - Duration::seconds(901))
            .unwrap();

        assert!(matches!(
            tokens.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let tokens = provider();
        let token = tokens
            .issue_at(SUBJECT, Utc::now() - Duration::seconds(850))
            .unwrap();
        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = provider().issue(SUBJECT).unwrap();
        let other = TokenProvider::new(b"fedcba9876543210fedcba9876543210", ISSUER, 900);
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let token = TokenProvider::new(SECRET, "someone-else", 900)
            .issue(SUBJECT)
            .unwrap();
        assert!(matches!(
            provider().verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = provider();
        let token = tokens.issue(SUBJECT).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = b64(serde_json::json!({
            "iss": ISSUER,
            "sub": "0x0000000000000000000000000000000000000000",
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 900,
        }));
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(tokens.verify(&forged), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        // Same secret, different algorithm: must not be accepted.
        let now = Utc::now();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + 900,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            provider().verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_alg_none_rejected() {
        let header = b64(serde_json::json!({ "alg": "none", "typ": "JWT" }));
        let payload = b64(serde_json::json!({
            "iss": ISSUER,
            "sub": SUBJECT,
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 900,
        }));
        let token = format!("{}.{}.", header, payload);

        assert!(matches!(
            provider().verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_missing_subject_rejected() {
        #[derive(Serialize)]
        struct NoSubject {
            iss: String,
            exp: i64,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoSubject {
                iss: ISSUER.to_string(),
                exp: Utc::now().timestamp() + 900,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            provider().verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = provider();
        for garbage in ["", "abc", "a.b.c", "....", "eyJhbGciOiJIUzI1NiJ9"] {
            assert!(matches!(
                tokens.verify(garbage),
                Err(AppError::Unauthorized(_))
            ));
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let shown = format!("{:?}", provider());
        assert!(shown.contains("[REDACTED]"));
        assert!(!shown.contains("0123456789abcdef"));
    }
}
