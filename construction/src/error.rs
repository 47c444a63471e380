//! # Construction Errors
//!
//! Every stage of the workflow is total: it returns a value or one of the
//! errors below, never an empty success. Each variant maps to a stable
//! numeric code and a retriable flag, which is what the HTTP layer reports
//! to clients as the Rosetta `Error` object.
//!
//! Input errors are never retriable: malformed input does not become valid
//! by sending it again. Only transient chain-RPC conditions and a full
//! submission pool are worth a retry.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::chain::ChainRpcError;
use crate::types::Metadata;

/// Errors produced by the construction workflow and its codecs.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// The request named a blockchain or network this instance does not serve.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// Public key bytes are malformed for the declared curve, or the curve
    /// is not secp256k1.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// An address encoding other than `hex` or `bech32` was requested.
    #[error("invalid address type: {0}")]
    InvalidAddressType(String),

    /// The string is neither a valid bech32 nor a valid hex address.
    #[error("malformed address: {0}")]
    MalformedAddress(String),

    /// The operations do not describe a supported transfer intent.
    #[error("invalid operations: {0}")]
    InvalidOperations(String),

    /// A metadata value is missing or has the wrong shape.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// The version word is missing, not numeric, or names an unknown
    /// message version or a foreign chain.
    #[error("unsupported transaction version: {0}")]
    UnsupportedTransactionVersion(String),

    #[error("signature count mismatch: expected {expected}, got {got}")]
    SignatureCountMismatch { expected: usize, got: usize },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signed transaction is empty")]
    EmptySignedTransaction,

    /// Canonical encoding failed. Unreachable for a structurally valid
    /// transaction; reported rather than panicking.
    #[error("hash computation failed: {0}")]
    HashComputation(String),

    /// The blob declared an `id` that is not the hash of its content.
    #[error("declared hash {declared} does not match computed hash {computed}")]
    HashMismatch { declared: String, computed: String },

    /// The submission sink refused the transaction.
    #[error("submission rejected: {reason}")]
    SubmissionRejected { reason: String, retriable: bool },

    #[error("chain rpc failure: {0}")]
    ExternalRpc(#[from] ChainRpcError),

    /// The stage needs the chain node but this instance runs offline.
    #[error("endpoint unavailable in offline mode")]
    Offline,

    /// The request body is not JSON or lacks a required field.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl ConstructionError {
    /// Stable numeric code reported to clients.
    pub fn code(&self) -> u32 {
        match self {
            Self::UnsupportedNetwork(_) => 1,
            Self::InvalidPublicKey(_) => 2,
            Self::InvalidAddressType(_) => 3,
            Self::MalformedAddress(_) => 4,
            Self::InvalidOperations(_) => 5,
            Self::InvalidMetadata(_) => 6,
            Self::MalformedTransaction(_) => 7,
            Self::UnsupportedTransactionVersion(_) => 8,
            Self::SignatureCountMismatch { .. } => 9,
            Self::InvalidSignature(_) => 10,
            Self::EmptySignedTransaction => 11,
            Self::HashComputation(_) => 12,
            Self::HashMismatch { .. } => 13,
            Self::SubmissionRejected { .. } => 14,
            Self::ExternalRpc(_) => 15,
            Self::Offline => 16,
            Self::MalformedRequest(_) => 17,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn retriable(&self) -> bool {
        match self {
            Self::SubmissionRejected { retriable, .. } => *retriable,
            Self::ExternalRpc(cause) => cause.is_retriable(),
            _ => false,
        }
    }

    /// Fixed, human-readable description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedNetwork(_) => "Unsupported network",
            Self::InvalidPublicKey(_) => "Invalid public key",
            Self::InvalidAddressType(_) => "Invalid address type",
            Self::MalformedAddress(_) => "Malformed address",
            Self::InvalidOperations(_) => "Invalid operations",
            Self::InvalidMetadata(_) => "Invalid metadata",
            Self::MalformedTransaction(_) => "Malformed transaction",
            Self::UnsupportedTransactionVersion(_) => "Unsupported transaction version",
            Self::SignatureCountMismatch { .. } => "Signature count mismatch",
            Self::InvalidSignature(_) => "Invalid signature",
            Self::EmptySignedTransaction => "Signed transaction is empty",
            Self::HashComputation(_) => "Unable to compute transaction hash",
            Self::HashMismatch { .. } => "Transaction hash mismatch",
            Self::SubmissionRejected { .. } => "Transaction rejected by submission pool",
            Self::ExternalRpc(_) => "Chain node request failed",
            Self::Offline => "Endpoint unavailable offline",
            Self::MalformedRequest(_) => "Malformed request body",
        }
    }

    /// Converts the error into the wire object returned to clients.
    pub fn to_api_error(&self) -> ApiError {
        let mut details = Metadata::new();
        details.insert("error".to_string(), Value::String(self.to_string()));
        match self {
            Self::SignatureCountMismatch { expected, got } => {
                details.insert("expected".to_string(), json!(expected));
                details.insert("got".to_string(), json!(got));
            }
            Self::HashMismatch { declared, computed } => {
                details.insert("declared".to_string(), json!(declared));
                details.insert("computed".to_string(), json!(computed));
            }
            _ => {}
        }

        ApiError {
            code: self.code(),
            message: self.description().to_string(),
            retriable: self.retriable(),
            details: Some(details),
        }
    }
}

/// The Rosetta `Error` object: numeric code, message, retriable flag and
/// optional structured details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u32,
    pub message: String,
    pub retriable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Metadata>,
}

impl From<&ConstructionError> for ApiError {
    fn from(err: &ConstructionError) -> Self {
        err.to_api_error()
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConstructionError>;
