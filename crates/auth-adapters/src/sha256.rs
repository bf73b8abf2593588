//! # SHA-256 token verifier
//!
//! Only the digest of the shared token is configured. A presented token is
//! hashed and compared against it in time independent of where the first
//! differing byte sits.

use domains::TokenVerifier;
use sha2::{Digest, Sha256};
use thiserror::Error;

const DIGEST_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenDigestError {
    #[error("token digest is not valid hex: {0}")]
    InvalidHex(String),

    #[error("token digest must be {DIGEST_LEN} bytes, got {0}")]
    WrongLength(usize),
}

/// Constant-time byte comparison. Length mismatch returns `false` early;
/// only lengths leak, never content.
pub fn timing_safe_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    // Low byte accumulates differences; the high byte is a fixed sentinel.
    let mut diff: u32 = 0xff00;
    for (x, y) in a.iter().zip(b) {
        diff |= u32::from(x ^ y);
    }
    diff == 0xff00
}

/// Lowercase hex SHA-256 of `token`, the form the coordinator is configured with.
pub fn token_digest_hex(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct Sha256TokenVerifier {
    expected: [u8; DIGEST_LEN],
}

impl std::fmt::Debug for Sha256TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256TokenVerifier").finish_non_exhaustive()
    }
}

impl Sha256TokenVerifier {
    /// Builds a verifier from the lowercase or uppercase hex of SHA-256(token).
    pub fn from_hex(digest_hex: &str) -> Result<Self, TokenDigestError> {
        let bytes = hex::decode(digest_hex.trim())
            .map_err(|e| TokenDigestError::InvalidHex(e.to_string()))?;
        let expected: [u8; DIGEST_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TokenDigestError::WrongLength(bytes.len()))?;
        Ok(Self { expected })
    }

    /// Convenience for tests and tooling: verifier for a known plaintext.
    pub fn for_token(token: &str) -> Self {
        let mut expected = [0u8; DIGEST_LEN];
        expected.copy_from_slice(&Sha256::digest(token.as_bytes()));
        Self { expected }
    }
}

impl TokenVerifier for Sha256TokenVerifier {
    fn verify(&self, token: &str) -> bool {
        let presented = Sha256::digest(token.as_bytes());
        let ok = timing_safe_equal(presented.as_slice(), &self.expected);
        if !ok {
            tracing::debug!("bearer token rejected");
        }
        ok
    }
}
