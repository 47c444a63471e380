//! Identifier and value objects shared by every endpoint.

use serde::{Deserialize, Serialize};

use crate::config::{CURRENCY_DECIMALS, CURRENCY_SYMBOL};
use crate::crypto::{CurveType, SignatureType};
use crate::types::Metadata;

/// Names the chain and network a request targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentifier {
    pub blockchain: String,
    pub network: String,
}

impl NetworkIdentifier {
    pub fn new(blockchain: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            blockchain: blockchain.into(),
            network: network.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl AccountIdentifier {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

/// Position of an operation within its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    pub index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_index: Option<i64>,
}

impl OperationIdentifier {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            network_index: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Currency {
    /// The chain's native currency, denominated in Qa on the wire.
    pub fn zil() -> Self {
        Self {
            symbol: CURRENCY_SYMBOL.to_string(),
            decimals: CURRENCY_DECIMALS,
            metadata: None,
        }
    }

    pub fn is_zil(&self) -> bool {
        self.symbol == CURRENCY_SYMBOL && self.decimals == CURRENCY_DECIMALS
    }
}

/// A signed integer amount, as a decimal string in the smallest unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Amount {
    pub fn zil(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            currency: Currency::zil(),
            metadata: None,
        }
    }
}

/// A public key as supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub hex_bytes: String,
    pub curve_type: CurveType,
}

/// Bytes the client must sign, and who must sign them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningPayload {
    /// Deprecated in favour of `account_identifier`, still sent by older
    /// clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_identifier: Option<AccountIdentifier>,
    pub hex_bytes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<SignatureType>,
}

impl SigningPayload {
    /// The signer address, whichever field the client used.
    pub fn signer_address(&self) -> Option<&str> {
        self.account_identifier
            .as_ref()
            .map(|a| a.address.as_str())
            .or(self.address.as_deref())
    }
}

/// A signature returned by the client for one signing payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub signing_payload: SigningPayload,
    pub public_key: PublicKey,
    pub signature_type: SignatureType,
    pub hex_bytes: String,
}
