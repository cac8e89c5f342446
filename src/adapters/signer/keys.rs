//! Private key parsing.
//!
//! Accepted encodings:
//! - Bech32 `suiprivkey1...` (flag byte + 32-byte secret)
//! - Base64 of `flag || secret` (33 bytes), as written by `sui keytool`
//! - Base64 of a bare 32-byte Ed25519 secret
//!
//! Only the Ed25519 scheme (flag `0x00`) is supported.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use thiserror::Error;

/// Human-readable part of Sui bech32 private keys.
pub const SUI_PRIVKEY_HRP: &str = "suiprivkey";

/// Signature scheme flag for Ed25519.
pub const ED25519_FLAG: u8 = 0x00;

/// A credential string that cannot be turned into a signing key.
///
/// Never carries the key material itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialFormatError {
    #[error("private key is empty")]
    Empty,
    #[error("private key is not valid bech32: {0}")]
    Bech32(String),
    #[error("unexpected bech32 prefix {0}, expected {SUI_PRIVKEY_HRP}")]
    WrongPrefix(String),
    #[error("private key is neither bech32 nor base64")]
    Undecodable,
    #[error("unsupported signature scheme flag {0:#04x}, only Ed25519 is supported")]
    UnsupportedScheme(u8),
    #[error("private key has {0} bytes, expected 32 or 33")]
    BadLength(usize),
}

/// Decode `raw` into a 32-byte Ed25519 secret.
pub fn parse_private_key(raw: &str) -> Result<[u8; 32], CredentialFormatError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CredentialFormatError::Empty);
    }

    let bytes = if trimmed
        .get(..SUI_PRIVKEY_HRP.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(SUI_PRIVKEY_HRP))
    {
        let (hrp, data) =
            bech32::decode(trimmed).map_err(|e| CredentialFormatError::Bech32(e.to_string()))?;
        let prefix = hrp.to_string();
        if !prefix.eq_ignore_ascii_case(SUI_PRIVKEY_HRP) {
            return Err(CredentialFormatError::WrongPrefix(prefix));
        }
        data
    } else {
        B64.decode(trimmed)
            .map_err(|_| CredentialFormatError::Undecodable)?
    };

    secret_from_bytes(&bytes)
}

fn secret_from_bytes(bytes: &[u8]) -> Result<[u8; 32], CredentialFormatError> {
    let secret = match bytes.len() {
        33 => {
            if bytes[0] != ED25519_FLAG {
                return Err(CredentialFormatError::UnsupportedScheme(bytes[0]));
            }
            &bytes[1..]
        }
        32 => bytes,
        n => return Err(CredentialFormatError::BadLength(n)),
    };

    let mut out = [0u8; 32];
    out.copy_from_slice(secret);
    Ok(out)
}
