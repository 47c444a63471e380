//! The unsigned-transaction blob.
//!
//! Between payloads and combine the client holds everything the server will
//! need later, because the server keeps nothing:
//!
//! ```text
//! {"transaction": {…native payload, no signature…},
//!  "signers": ["zil1…"],
//!  "metadata": {…pass-through keys…}}
//! ```
//!
//! `signers` is ordered; signing payloads are returned in the same order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::error::{ConstructionError, Result};
use crate::transaction::{NativeTransaction, TransactionCodec};
use crate::types::Metadata;

/// A decoded unsigned-transaction blob.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedEnvelope {
    pub transaction: NativeTransaction,
    pub signers: Vec<Address>,
    pub metadata: Metadata,
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    transaction: Value,
    signers: Vec<String>,
    #[serde(default)]
    metadata: Metadata,
}

impl UnsignedEnvelope {
    /// Whether a decoded JSON value has the envelope shape rather than the
    /// bare native-payload shape.
    pub fn is_envelope(value: &Value) -> bool {
        value.get("transaction").map_or(false, Value::is_object)
    }

    pub fn encode(&self, codec: &TransactionCodec) -> Result<String> {
        let wire = WireEnvelope {
            transaction: codec.to_value(&self.transaction)?,
            signers: self.signers.iter().map(Address::to_bech32).collect(),
            metadata: self.metadata.clone(),
        };
        serde_json::to_string(&wire)
            .map_err(|e| ConstructionError::MalformedTransaction(format!("serialize: {}", e)))
    }

    pub fn decode(codec: &TransactionCodec, blob: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(blob)
            .map_err(|e| ConstructionError::MalformedTransaction(format!("invalid json: {}", e)))?;
        Self::from_value(codec, value)
    }

    pub fn from_value(codec: &TransactionCodec, value: Value) -> Result<Self> {
        if !Self::is_envelope(&value) {
            return Err(ConstructionError::MalformedTransaction(
                "not an unsigned transaction envelope".into(),
            ));
        }
        let wire: WireEnvelope = serde_json::from_value(value)
            .map_err(|e| ConstructionError::MalformedTransaction(e.to_string()))?;

        let transaction = codec.parse_value(wire.transaction)?;
        if transaction.is_signed() {
            return Err(ConstructionError::MalformedTransaction(
                "unsigned transaction already carries a signature".into(),
            ));
        }

        let signers = wire
            .signers
            .iter()
            .map(|s| {
                Address::decode(s).map_err(|e| {
                    ConstructionError::MalformedTransaction(format!("signer {}: {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if signers.is_empty() {
            return Err(ConstructionError::MalformedTransaction(
                "envelope lists no signers".into(),
            ));
        }

        Ok(Self {
            transaction,
            signers,
            metadata: wire.metadata,
        })
    }
}
