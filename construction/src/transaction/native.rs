//! The native Zilliqa transaction.
//!
//! On the wire a transaction is the JSON object the node's
//! `CreateTransaction` method takes:
//!
//! ```text
//! {"version": 21823489, "nonce": 2, "toAddr": "…", "amount": "1000",
//!  "pubKey": "02…", "gasPrice": "2000000000", "gasLimit": "50",
//!  "code": "", "data": "", "signature": "…", "priority": false}
//! ```
//!
//! Amounts and gas are strings because Qa values overflow JSON numbers.
//! We accept numbers too, and may see an `id` a client declared.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::config::{unpack_version, SIGNATURE_LENGTH};
use crate::crypto::ZilPublicKey;
use crate::error::{ConstructionError, Result};

/// A structured Zilliqa transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTransaction {
    /// Declared or assigned transaction hash. Not part of the hashed core.
    pub id: Option<String>,
    /// `(chain_id << 16) | msg_version`.
    pub version: u32,
    pub nonce: u64,
    pub to_addr: Address,
    /// Amount in Qa.
    pub amount: u128,
    /// Sender key; the sender address is derived from it.
    pub pub_key: ZilPublicKey,
    /// Gas price in Qa.
    pub gas_price: u128,
    pub gas_limit: u64,
    pub code: String,
    pub data: String,
    /// Schnorr signature over the core bytes, absent until combine.
    pub signature: Option<[u8; SIGNATURE_LENGTH]>,
    pub priority: bool,
}

impl NativeTransaction {
    /// The paying account.
    pub fn sender(&self) -> Address {
        Address::from_public_key(&self.pub_key)
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn chain_id(&self) -> u32 {
        unpack_version(self.version).0
    }

    /// Upper bound on the fee: every unit of gas at the offered price.
    pub fn max_fee(&self) -> u128 {
        self.gas_price.saturating_mul(self.gas_limit as u128)
    }

    pub fn signature_hex(&self) -> Option<String> {
        self.signature.map(hex::encode)
    }

    pub(crate) fn to_wire(&self) -> WireTransaction {
        WireTransaction {
            id: self.id.clone(),
            version: self.version,
            nonce: WireInt::Number(self.nonce),
            to_addr: self.to_addr.to_checksum_hex(),
            amount: WireInt::Text(self.amount.to_string()),
            pub_key: self.pub_key.to_hex(),
            gas_price: WireInt::Text(self.gas_price.to_string()),
            gas_limit: WireInt::Text(self.gas_limit.to_string()),
            code: self.code.clone(),
            data: self.data.clone(),
            signature: self.signature_hex().unwrap_or_default(),
            priority: self.priority,
        }
    }

    pub(crate) fn from_wire(wire: WireTransaction) -> Result<Self> {
        let to_addr = Address::decode(&wire.to_addr)
            .map_err(|e| malformed(format!("toAddr: {}", e)))?;
        let pub_key = ZilPublicKey::from_hex(&wire.pub_key)
            .map_err(|e| malformed(format!("pubKey: {}", e)))?;

        let signature = match wire.signature.trim() {
            "" => None,
            sig => Some(decode_signature(sig)?),
        };

        let nonce = u64::try_from(wire.nonce.to_u128("nonce")?)
            .map_err(|_| malformed("nonce exceeds u64"))?;
        let gas_limit = u64::try_from(wire.gas_limit.to_u128("gasLimit")?)
            .map_err(|_| malformed("gasLimit exceeds u64"))?;

        Ok(Self {
            id: wire.id.filter(|id| !id.is_empty()),
            version: wire.version,
            nonce,
            to_addr,
            amount: wire.amount.to_u128("amount")?,
            pub_key,
            gas_price: wire.gas_price.to_u128("gasPrice")?,
            gas_limit,
            code: wire.code,
            data: wire.data,
            signature,
            priority: wire.priority,
        })
    }
}

/// Decodes a 64-byte hex signature, with or without `0x`.
pub(crate) fn decode_signature(s: &str) -> Result<[u8; SIGNATURE_LENGTH]> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes =
        hex::decode(trimmed).map_err(|e| malformed(format!("signature is not hex: {}", e)))?;
    <[u8; SIGNATURE_LENGTH]>::try_from(bytes.as_slice()).map_err(|_| {
        malformed(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_LENGTH,
            bytes.len()
        ))
    })
}

fn malformed(msg: impl Into<String>) -> ConstructionError {
    ConstructionError::MalformedTransaction(msg.into())
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub version: u32,
    pub nonce: WireInt,
    pub to_addr: String,
    pub amount: WireInt,
    pub pub_key: String,
    pub gas_price: WireInt,
    pub gas_limit: WireInt,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub priority: bool,
}

/// An integer that may arrive as a JSON number or a decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireInt {
    Number(u64),
    Text(String),
}

impl WireInt {
    fn to_u128(&self, field: &str) -> Result<u128> {
        match self {
            Self::Number(n) => Ok(*n as u128),
            Self::Text(s) => s
                .trim()
                .parse::<u128>()
                .map_err(|_| malformed(format!("{} is not a non-negative integer: {:?}", field, s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PK: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn wire(overrides: serde_json::Value) -> WireTransaction {
        let mut base = json!({
            "version": 21823489,
            "nonce": 3,
            "toAddr": "8d393a22e4476ff8212de13fe1939de2a236f0a7",
            "amount": "1000000000000",
            "pubKey": PK,
            "gasPrice": "2000000000",
            "gasLimit": "50",
        });
        for (k, v) in overrides.as_object().unwrap() {
            base[k] = v.clone();
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn from_wire_reads_every_field() {
        let tx = NativeTransaction::from_wire(wire(json!({}))).unwrap();
        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.amount, 1_000_000_000_000);
        assert_eq!(tx.gas_price, 2_000_000_000);
        assert_eq!(tx.gas_limit, 50);
        assert_eq!(tx.chain_id(), 333);
        assert!(!tx.is_signed());
        assert_eq!(
            tx.sender().to_hex(),
            "29e562f73488c8a2bb9dbc5700b361d54b9b0554"
        );
    }

    #[test]
    fn numbers_and_strings_are_interchangeable() {
        let a = NativeTransaction::from_wire(wire(json!({"gasLimit": 50, "nonce": "3"}))).unwrap();
        let b = NativeTransaction::from_wire(wire(json!({}))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bech32_recipient_is_accepted() {
        let tx = NativeTransaction::from_wire(wire(
            json!({"toAddr": "zil135un5ghygahlsgfduyl7ryuau23rdu98f354v4"}),
        ))
        .unwrap();
        assert_eq!(tx.to_addr.to_hex(), "8d393a22e4476ff8212de13fe1939de2a236f0a7");
    }

    #[test]
    fn short_signature_is_malformed() {
        let err = NativeTransaction::from_wire(wire(json!({"signature": "abcd"}))).unwrap_err();
        assert!(matches!(err, ConstructionError::MalformedTransaction(_)));
    }

    #[test]
    fn negative_amount_is_malformed() {
        let err = NativeTransaction::from_wire(wire(json!({"amount": "-1"}))).unwrap_err();
        assert!(matches!(err, ConstructionError::MalformedTransaction(_)));
    }

    #[test]
    fn empty_id_is_treated_as_absent() {
        let tx = NativeTransaction::from_wire(wire(json!({"id": ""}))).unwrap();
        assert!(tx.id.is_none());
    }

    #[test]
    fn max_fee_multiplies_price_by_limit() {
        let tx = NativeTransaction::from_wire(wire(json!({}))).unwrap();
        assert_eq!(tx.max_fee(), 100_000_000_000);
    }
}
