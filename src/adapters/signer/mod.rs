//! Key custody and transaction signing.

pub mod ed25519;
pub mod keys;

pub use ed25519::Ed25519Signer;
pub use keys::{parse_private_key, CredentialFormatError};
