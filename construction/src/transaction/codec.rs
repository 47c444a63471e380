//! # Transaction Codec
//!
//! Converts between signed-transaction blobs and [`NativeTransaction`], and
//! computes the canonical hash.
//!
//! ## Canonical core encoding
//!
//! The core bytes are the node's `ProtoTransactionCoreInfo` protobuf
//! message (see [`proto`](super::proto)):
//!
//! ```text
//! 1 version       uint32
//! 2 nonce         uint64
//! 3 toaddr        bytes (20)
//! 4 senderpubkey  ByteArray (33, compressed)
//! 5 amount        ByteArray (16, big-endian uint128)
//! 6 gasprice      ByteArray (16, big-endian uint128)
//! 7 gaslimit      uint64
//! 8 code          bytes, only when non-empty
//! 9 data          bytes, only when non-empty
//! ```
//!
//! The signature, the id and the priority flag are not part of it. These
//! are the bytes a client signs, and their SHA-256 is the transaction hash
//! the node reports.

use serde_json::Value;
use tracing::debug;

use crate::config::{pack_version, unpack_version, MSG_VERSION};
use crate::crypto::sha256_array;
use crate::error::{ConstructionError, Result};
use crate::transaction::native::{NativeTransaction, WireTransaction};
use crate::transaction::proto::ProtoTransactionCoreInfo;

/// Parses, hashes and serializes transactions for one chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionCodec {
    chain_id: u32,
}

impl TransactionCodec {
    pub fn new(chain_id: u32) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    /// The version word transactions built by this codec carry.
    pub fn version(&self) -> u32 {
        pack_version(self.chain_id, MSG_VERSION)
    }

    /// Parses a JSON blob.
    ///
    /// Structural problems are `MalformedTransaction`; a missing, non-numeric
    /// or foreign version word is `UnsupportedTransactionVersion`.
    pub fn parse(&self, blob: &[u8]) -> Result<NativeTransaction> {
        let value: Value = serde_json::from_slice(blob)
            .map_err(|e| ConstructionError::MalformedTransaction(format!("invalid json: {}", e)))?;
        self.parse_value(value)
    }

    /// Same as [`parse`](Self::parse) for an already-decoded JSON value.
    pub fn parse_value(&self, value: Value) -> Result<NativeTransaction> {
        let object = value.as_object().ok_or_else(|| {
            ConstructionError::MalformedTransaction("transaction must be a JSON object".into())
        })?;
        self.check_version(object.get("version"))?;

        let wire: WireTransaction = serde_json::from_value(value)
            .map_err(|e| ConstructionError::MalformedTransaction(e.to_string()))?;
        NativeTransaction::from_wire(wire)
    }

    fn check_version(&self, version: Option<&Value>) -> Result<()> {
        let unsupported = |msg: String| ConstructionError::UnsupportedTransactionVersion(msg);

        let raw = version
            .ok_or_else(|| unsupported("missing version".into()))?
            .as_u64()
            .ok_or_else(|| unsupported("version must be an unsigned integer".into()))?;
        let word = u32::try_from(raw).map_err(|_| unsupported(format!("version {} out of range", raw)))?;

        let (chain_id, msg_version) = unpack_version(word);
        if msg_version != MSG_VERSION {
            return Err(unsupported(format!(
                "message version {} is not supported",
                msg_version
            )));
        }
        if chain_id != self.chain_id {
            return Err(unsupported(format!(
                "chain id {} does not match network chain id {}",
                chain_id, self.chain_id
            )));
        }
        Ok(())
    }

    /// Canonical core bytes: what gets signed and hashed.
    pub fn core_bytes(&self, tx: &NativeTransaction) -> Result<Vec<u8>> {
        if tx.version != self.version() {
            return Err(ConstructionError::HashComputation(format!(
                "version word {} is not this network's {}",
                tx.version,
                self.version()
            )));
        }
        Ok(ProtoTransactionCoreInfo::from(tx).to_bytes())
    }

    /// Lowercase hex SHA-256 of the core bytes. Pure and deterministic.
    pub fn hash(&self, tx: &NativeTransaction) -> Result<String> {
        let core = self.core_bytes(tx)?;
        let hash = hex::encode(sha256_array(&core));
        debug!(hash = %hash, nonce = tx.nonce, "computed transaction hash");
        Ok(hash)
    }

    /// JSON value of the wire form.
    pub fn to_value(&self, tx: &NativeTransaction) -> Result<Value> {
        serde_json::to_value(tx.to_wire())
            .map_err(|e| ConstructionError::MalformedTransaction(format!("serialize: {}", e)))
    }

    /// Serializes to the JSON blob [`parse`](Self::parse) accepts.
    pub fn serialize(&self, tx: &NativeTransaction) -> Result<Vec<u8>> {
        serde_json::to_vec(&tx.to_wire())
            .map_err(|e| ConstructionError::MalformedTransaction(format!("serialize: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
