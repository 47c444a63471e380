//! # Cryptographic Primitives
//!
//! Thin, typed wrappers around audited implementations: `secp256k1` for
//! public-key validation and `sha2` for the hashes Zilliqa uses for both
//! addresses and transaction ids.
//!
//! Signing is not here and never will be. Keys stay with the client; this
//! crate only checks that what it is handed is well-formed.

pub mod hash;
pub mod keys;

pub use hash::{sha256, sha256_array};
pub use keys::{CurveType, KeyError, SignatureType, ZilPublicKey};
