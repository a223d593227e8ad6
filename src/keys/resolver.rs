//! Key string resolution.
//!
//! Accepted encodings for ed25519 keys:
//! - 64 hex characters of raw key material, with or without a `0x` prefix
//! - DER-encoded hex (PKCS#8 for private keys, SPKI for public keys)

use thiserror::Error;

use crate::keys::key::{PrivateKey, PublicKey, ED25519_PRIVATE_DER_PREFIX, ED25519_PUBLIC_DER_PREFIX};

/// Errors from resolving or loading keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid key encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid operator account id: {0}")]
    InvalidAccount(String),

    #[error("operator private key not configured (set operator.private_key or {0})")]
    MissingOperatorKey(&'static str),
}

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;

/// Turns opaque key strings into key handles.
pub trait KeyResolver: Send + Sync {
    fn private_key(&self, encoded: &str) -> KeyResult<PrivateKey>;

    fn public_key(&self, encoded: &str) -> KeyResult<PublicKey>;
}

/// Default resolver for hex and DER-hex ed25519 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519KeyResolver;

impl KeyResolver for Ed25519KeyResolver {
    fn private_key(&self, encoded: &str) -> KeyResult<PrivateKey> {
        decode_private(encoded)
    }

    fn public_key(&self, encoded: &str) -> KeyResult<PublicKey> {
        decode_public(encoded)
    }
}

pub(crate) fn decode_private(encoded: &str) -> KeyResult<PrivateKey> {
    decode_key_bytes(encoded, ED25519_PRIVATE_DER_PREFIX).map(PrivateKey::from_bytes)
}

pub(crate) fn decode_public(encoded: &str) -> KeyResult<PublicKey> {
    decode_key_bytes(encoded, ED25519_PUBLIC_DER_PREFIX).and_then(PublicKey::from_bytes)
}

fn decode_key_bytes(encoded: &str, der_prefix: &str) -> KeyResult<[u8; 32]> {
    let trimmed = encoded.trim();
    let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed).to_ascii_lowercase();
    let raw = hex_str.strip_prefix(der_prefix).unwrap_or(&hex_str);

    let bytes = hex::decode(raw).map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| KeyError::InvalidLength(len))
}
