// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Zilliqa Construction API
//!
//! The Construction half of the Rosetta protocol for Zilliqa: everything a
//! client needs to build, sign offline, and submit a ZIL transfer without
//! knowing Zilliqa's address format, transaction layout or hash.
//!
//! ## Architecture
//!
//! - **config**: Chain constants and the network an instance serves.
//! - **crypto**: secp256k1 key validation and SHA-256.
//! - **address**: Key-to-address derivation, hex and Bech32 encodings.
//! - **transaction**: The native transaction, its codec, the unsigned
//!   envelope and transfer intents.
//! - **types**: Request and response bodies of the eight endpoints.
//! - **chain**: The node collaborator: JSON-RPC client and an in-memory
//!   stand-in.
//! - **mempool**: The submission sink and the pool behind it.
//! - **workflow**: `ConstructionService`, the stages themselves.
//! - **error**: Error kinds, codes and the retriable flag.
//!
//! ## Flow
//!
//! ```text
//! derive → preprocess → metadata → payloads → parse/combine → hash → submit
//! ```
//!
//! Each call stands alone. State travels with the client as metadata, so
//! any replica can serve any step.

pub mod address;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod mempool;
pub mod transaction;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ApiError, ConstructionError, Result};
pub use workflow::{ConstructionService, RequestContext};
