//! Authentication layer: nonce challenges, secp256k1 signature recovery and
//! JWT bearer tokens.

pub mod middleware;
pub mod nonce;
pub mod protocol;
pub mod token;
pub mod verify;

pub use middleware::{AppState, AuthenticatedUser};
pub use nonce::{generate_nonce, NonceSource, OsNonceSource};
pub use token::{Claims, TokenProvider};
pub use verify::{recover_address, verify_signature};
