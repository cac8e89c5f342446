//! Ed25519 transaction signer.
//!
//! Sui signs `Blake2b-256(intent || tx_bytes)` where the intent prefix for
//! a transaction is `[0, 0, 0]` (TransactionData, V0, Sui app). The
//! serialized signature is `flag || signature || public_key`, base64.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer as _, SigningKey};

use crate::ports::signer::{SignerError, TransactionSigner};

use super::keys::{parse_private_key, CredentialFormatError, ED25519_FLAG};

type Blake2b256 = Blake2b<U32>;

/// Intent prefix for transaction data.
const TX_INTENT: [u8; 3] = [0, 0, 0];

/// Signer holding one Ed25519 key.
pub struct Ed25519Signer {
    key: SigningKey,
    address: String,
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Ed25519Signer {
    pub fn from_secret(secret: [u8; 32]) -> Self {
        let key = SigningKey::from_bytes(&secret);
        let address = derive_address(&key.verifying_key().to_bytes());
        Self { key, address }
    }

    /// Parse any accepted private key encoding.
    pub fn from_encoded(raw: &str) -> Result<Self, CredentialFormatError> {
        parse_private_key(raw).map(Self::from_secret)
    }

    /// Intent digest that is actually signed.
    pub fn signing_digest(tx_bytes: &[u8]) -> [u8; 32] {
        let mut hasher = Blake2b256::new();
        hasher.update(TX_INTENT);
        hasher.update(tx_bytes);
        hasher.finalize().into()
    }

    fn serialize(&self, tx_bytes: &[u8]) -> Vec<u8> {
        let sig = self.key.sign(&Self::signing_digest(tx_bytes));
        let mut out = Vec::with_capacity(1 + 64 + 32);
        out.push(ED25519_FLAG);
        out.extend_from_slice(&sig.to_bytes());
        out.extend_from_slice(&self.key.verifying_key().to_bytes());
        out
    }
}

/// `0x` + hex(Blake2b-256(flag || public_key)).
pub fn derive_address(public_key: &[u8; 32]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[async_trait]
impl TransactionSigner for Ed25519Signer {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign(&self, tx_bytes: &[u8]) -> Result<String, SignerError> {
        if tx_bytes.is_empty() {
            return Err(SignerError("refusing to sign empty transaction".to_string()));
        }
        Ok(B64.encode(self.serialize(tx_bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    #[test]
    fn test_address_shape() {
        let signer = Ed25519Signer::from_secret([1u8; 32]);
        assert!(signer.address().starts_with("0x"));
        assert_eq!(signer.address().len(), 66);
    }

    #[test]
    fn test_address_is_deterministic() {
        let a = Ed25519Signer::from_secret([5u8; 32]);
        let b = Ed25519Signer::from_secret([5u8; 32]);
        let c = Ed25519Signer::from_secret([6u8; 32]);
        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), c.address());
    }

    #[tokio::test]
    async fn test_signature_layout_and_verification() {
        let signer = Ed25519Signer::from_secret([2u8; 32]);
        let tx = b"transaction-bytes";
        let encoded = signer.sign(tx).await.unwrap();
        let raw = B64.decode(encoded).unwrap();

        assert_eq!(raw.len(), 97);
        assert_eq!(raw[0], ED25519_FLAG);

        let sig = Signature::from_slice(&raw[1..65]).unwrap();
        let pk_bytes: [u8; 32] = raw[65..].try_into().unwrap();
        let pk = VerifyingKey::from_bytes(&pk_bytes).unwrap();
        pk.verify(&Ed25519Signer::signing_digest(tx), &sig).unwrap();
        assert_eq!(derive_address(&pk_bytes), signer.address());
    }

    #[tokio::test]
    async fn test_empty_tx_rejected() {
        let signer = Ed25519Signer::from_secret([2u8; 32]);
        assert!(signer.sign(&[]).await.is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = Ed25519Signer::from_secret([4u8; 32]);
        let dbg = format!("{signer:?}");
        assert!(dbg.contains(signer.address()));
        assert!(!dbg.contains("key"));
    }
}
