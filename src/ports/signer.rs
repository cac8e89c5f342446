//! Transaction Signer Port
//!
//! Key material never leaves the signer: callers pass unsigned
//! transaction bytes and get back a serialized signature.

use async_trait::async_trait;
use thiserror::Error;

/// Signing failure.
#[derive(Debug, Error)]
#[error("signer error: {0}")]
pub struct SignerError(pub String);

/// Trait for transaction signers.
#[async_trait]
pub trait TransactionSigner: Send + Sync + 'static {
  /// Sui address of the signing account.
  fn address(&self) -> &str;

  /// Sign BCS `TransactionData` bytes.
  ///
  /// Returns the base64 serialized signature (`flag || sig || pubkey`).
  async fn sign(&self, tx_bytes: &[u8]) -> Result<String, SignerError>;
}
