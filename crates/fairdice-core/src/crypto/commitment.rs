//! Secret key and keyed commitment for the commit-reveal scheme.

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Secret key length in bytes
pub const KEY_LEN: usize = 32;

/// Errors from malformed commitment inputs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitmentError {
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// Secret key for the commitment MAC
///
/// Owned exclusively by the committing party until reveal time; one key per
/// protocol round, never reused.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Generate a fresh random key
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from the hex form published at reveal time
    pub fn from_hex(s: &str) -> Result<Self, CommitmentError> {
        let bytes = hex::decode(s).map_err(|e| CommitmentError::InvalidHex(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(CommitmentError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Hex form for the reveal step
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log key material before reveal time
        write!(f, "SecretKey(<hidden>)")
    }
}

/// Commitment = HMAC-SHA256(key, value)
///
/// Published before the counterpart's number is known; the digest alone
/// reveals nothing about the committed value without the key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment([u8; 32]);

impl Commitment {
    /// Compute the commitment over a value's canonical big-endian encoding
    pub fn over(key: &SecretKey, value: u64) -> Self {
        let mut mac =
            HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC takes a key of any length");
        mac.update(&value.to_be_bytes());
        let digest = mac.finalize().into_bytes();
        Self(digest.into())
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify that the given key and value produce this commitment
    pub fn verify(&self, key: &SecretKey, value: u64) -> bool {
        *self == Self::over(key, value)
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
