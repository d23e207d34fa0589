//! secp256k1 personal-sign signature verification.
//!
//! Wallets sign `keccak256("\x19Ethereum Signed Message:\n" + len + message)`
//! and hand back 65 bytes `r || s || v` with `v` in `{27, 28}`. Verification
//! recovers the public key from that signature and compares the derived
//! account address with the one being claimed.

use crate::error::AppError;
use crate::models::Address;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

/// Length of a wire signature: r (32) + s (32) + v (1).
pub const SIGNATURE_LEN: usize = 65;

/// Offset wallets add to the recovery id.
const LEGACY_V_OFFSET: u8 = 27;

const PERSONAL_SIGN_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Hash a message the way `personal_sign` does before signing.
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_SIGN_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Derive the account address of a public key.
///
/// The address is the last 20 bytes of the Keccak-256 hash of the
/// uncompressed point, without its leading `0x04` tag.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    let hash: [u8; 32] = Keccak256::digest(&point.as_bytes()[1..]).into();

    let mut account = [0u8; 20];
    account.copy_from_slice(&hash[12..]);
    Address::from_bytes(&account)
}

/// Decode a hex signature into its ECDSA part and normalized recovery id.
///
/// High-s signatures are rejected: each has a low-s twin that recovers the
/// same key, so accepting both would make signatures malleable.
fn decode_signature(signature_hex: &str) -> Result<(Signature, RecoveryId), AppError> {
    let digits = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);

    let bytes = hex::decode(digits)
        .map_err(|e| AppError::SignatureFormat(format!("Invalid signature hex: {}", e)))?;

    if bytes.len() != SIGNATURE_LEN {
        return Err(AppError::SignatureFormat(format!(
            "Invalid signature length: expected {} bytes, got {}",
            SIGNATURE_LEN,
            bytes.len()
        )));
    }

    let v = bytes[SIGNATURE_LEN - 1];
    let recovery_id = v
        .checked_sub(LEGACY_V_OFFSET)
        .and_then(RecoveryId::from_byte)
        .filter(|id| !id.is_x_reduced())
        .ok_or_else(|| AppError::SignatureFormat(format!("Invalid recovery id: {}", v)))?;

    let signature = Signature::from_slice(&bytes[..SIGNATURE_LEN - 1])
        .map_err(|e| AppError::SignatureFormat(format!("Invalid signature scalars: {}", e)))?;

    if signature.normalize_s().is_some() {
        return Err(AppError::SignatureFormat(
            "Non-canonical signature (high s)".to_string(),
        ));
    }

    Ok((signature, recovery_id))
}

/// Recover the account that produced a personal-sign signature over `message`.
///
/// # Errors
/// * `AppError::SignatureFormat` if the signature is malformed or no public
///   key can be recovered from it
pub fn recover_address(message: &[u8], signature_hex: &str) -> Result<Address, AppError> {
    let (signature, recovery_id) = decode_signature(signature_hex)?;
    let prehash = personal_sign_hash(message);

    let key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|e| AppError::SignatureFormat(format!("Public key recovery failed: {}", e)))?;

    Ok(address_of(&key))
}

/// Verify that `signature_hex` is a personal-sign signature over `message`
/// made by the key behind `expected`.
///
/// # Returns
/// * `Ok(true)` if the recovered address matches
/// * `Ok(false)` if the signature is well-formed but belongs to another account
/// * `Err(AppError::SignatureFormat)` if the signature cannot be decoded or recovered
pub fn verify_signature(
    expected: &Address,
    message: &[u8],
    signature_hex: &str,
) -> Result<bool, AppError> {
    let recovered = recover_address(message, signature_hex)?;
    Ok(&recovered == expected)
}

/// Sign `message` the way a wallet's `personal_sign` does.
///
/// Returns the 65-byte signature hex-encoded with a `0x` prefix and `v` in
/// `{27, 28}`.
pub fn sign_personal(key: &k256::ecdsa::SigningKey, message: &[u8]) -> Result<String, AppError> {
    let prehash = personal_sign_hash(message);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&prehash)
        .map_err(|e| AppError::Internal(format!("Signing failed: {}", e)))?;

    let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
    bytes.extend_from_slice(&signature.to_bytes());
    bytes.push(recovery_id.to_byte() + LEGACY_V_OFFSET);
    Ok(format!("0x{}", hex::encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn generate_test_signing_key() -> SigningKey {
        loop {
            let mut seed = [0u8; 32];
            rand::fill(&mut seed);
            if let Ok(key) = SigningKey::from_slice(&seed) {
                return key;
            }
        }
    }

    fn sig_bytes(sig_hex: &str) -> Vec<u8> {
        hex::decode(sig_hex.trim_start_matches("0x")).unwrap()
    }

    #[test]
    fn test_personal_sign_hash_known_vector() {
        // keccak256("\x19Ethereum Signed Message:\n11hello world")
        assert_eq!(
            hex::encode(personal_sign_hash(b"hello world")),
            "d9eba16ed0ecae432b71fe008c98cc872bb4cc214d3220a36f365326cf807d68"
        );
    }

    #[test]
    fn test_address_of_known_key() {
        // Private key 1 is the generator point.
        let mut one = [0u8; 32];
        one[31] = 1;
        let key = SigningKey::from_slice(&one).unwrap();
        assert_eq!(
            address_of(key.verifying_key()).as_str(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_verify_signature_valid() {
        let signing_key = generate_test_signing_key();
        let address = address_of(signing_key.verifying_key());

        let message = b"1234567890";
        let signature = sign_personal(&signing_key, message).unwrap();

        let result = verify_signature(&address, message, &signature);
        assert!(result.is_ok());
        assert!(result.unwrap());
    }

    #[test]
    fn test_signature_v_is_legacy_offset() {
        let signing_key = generate_test_signing_key();
        let signature = sign_personal(&signing_key, b"42").unwrap();
        let v = *sig_bytes(&signature).last().unwrap();
        assert!(v == 27 || v == 28);
    }

    #[test]
    fn test_signature_without_0x_prefix() {
        let signing_key = generate_test_signing_key();
        let address = address_of(signing_key.verifying_key());
        let signature = sign_personal(&signing_key, b"42").unwrap();

        assert!(verify_signature(&address, b"42", signature.trim_start_matches("0x")).unwrap());
    }

    #[test]
    fn test_verify_signature_wrong_message() {
        let signing_key = generate_test_signing_key();
        let address = address_of(signing_key.verifying_key());
        let signature = sign_personal(&signing_key, b"1111").unwrap();

        let result = verify_signature(&address, b"2222", &signature);
        assert!(result.is_ok());
        assert!(!result.unwrap());
    }

    #[test]
    fn test_verify_signature_other_account() {
        let signer = generate_test_signing_key();
        let claimed = address_of(generate_test_signing_key().verifying_key());
        let signature = sign_personal(&signer, b"777").unwrap();

        assert!(!verify_signature(&claimed, b"777", &signature).unwrap());
    }

    #[test]
    fn test_raw_recovery_id_rejected() {
        // v must carry the +27 offset; raw 0/1 is a format error.
        let signing_key = generate_test_signing_key();
        let mut bytes = sig_bytes(&sign_personal(&signing_key, b"9").unwrap());
        bytes[64] -= 27;

        let result = recover_address(b"9", &hex::encode(&bytes));
        assert!(matches!(result, Err(AppError::SignatureFormat(_))));
    }

    #[test]
    fn test_out_of_range_recovery_id_rejected() {
        let signing_key = generate_test_signing_key();
        let mut bytes = sig_bytes(&sign_personal(&signing_key, b"9").unwrap());
        for v in [0u8, 26, 29, 30, 35, 255] {
            bytes[64] = v;
            let result = recover_address(b"9", &hex::encode(&bytes));
            assert!(
                matches!(result, Err(AppError::SignatureFormat(_))),
                "v = {} accepted",
                v
            );
        }
    }

    #[test]
    fn test_high_s_rejected() {
        let signing_key = generate_test_signing_key();
        let bytes = sig_bytes(&sign_personal(&signing_key, b"5").unwrap());

        // Flip s to n - s and toggle the recovery parity: same key, other encoding.
        let low = Signature::from_slice(&bytes[..64]).unwrap();
        let (r, s) = low.split_scalars();
        let high = Signature::from_scalars(r, -*s).unwrap();

        let mut malleated = high.to_bytes().to_vec();
        malleated.push(bytes[64] ^ 1);

        let result = recover_address(b"5", &hex::encode(&malleated));
        assert!(matches!(result, Err(AppError::SignatureFormat(_))));
    }

    #[test]
    fn test_invalid_signature_length() {
        let result = recover_address(b"1", &hex::encode([0u8; 64]));
        assert!(matches!(result, Err(AppError::SignatureFormat(_))));

        let result = recover_address(b"1", &hex::encode([0u8; 66]));
        assert!(matches!(result, Err(AppError::SignatureFormat(_))));
    }

    #[test]
    fn test_invalid_signature_hex() {
        let result = recover_address(b"1", "0xnot-hex");
        assert!(matches!(result, Err(AppError::SignatureFormat(_))));
    }

    #[test]
    fn test_zero_scalars_rejected() {
        let mut bytes = [0u8; 65];
        bytes[64] = 27;
        let result = recover_address(b"1", &hex::encode(bytes));
        assert!(matches!(result, Err(AppError::SignatureFormat(_))));
    }
}
