//! # Hashing Utilities
//!
//! Zilliqa uses SHA-256 for everything the construction workflow touches:
//! address derivation (trailing 20 bytes of the key digest) and transaction
//! ids (digest of the canonical core encoding).

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use zil_construction::crypto::sha256;
///
/// let hash = sha256(b"zilliqa");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Same as [`sha256`] but returns a fixed-size array for callers that slice
/// into the digest.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
