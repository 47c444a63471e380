//! # Metadata Maps
//!
//! Metadata is the protocol's extension point: an ordered map of JSON values
//! the client echoes from one stage into the next. The workflow reads the
//! handful of keys listed in [`MetadataKey`] and copies everything else
//! through untouched.
//!
//! Integers that can exceed 2^53 (amounts and gas prices in Qa) are written
//! as decimal strings. Readers accept either a JSON number or a decimal
//! string, since hand-written clients send both.

use serde_json::{Map, Value};

use crate::address::AddressType;
use crate::error::{ConstructionError, Result};

/// Ordered string-keyed map of JSON values.
pub type Metadata = Map<String, Value>;

/// Every metadata key the workflow understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// Address encoding requested from derive: `hex` or `bech32`.
    AddressType,
    /// Bech32 address of the paying account, set by preprocess.
    Sender,
    Nonce,
    /// Gas price in Qa.
    GasPrice,
    GasLimit,
    /// Contract-call payload copied verbatim into the transaction.
    Data,
    /// Submission acknowledgement returned by submit.
    Status,
}

impl MetadataKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddressType => "type",
            Self::Sender => "sender",
            Self::Nonce => "nonce",
            Self::GasPrice => "gas_price",
            Self::GasLimit => "gas_limit",
            Self::Data => "data",
            Self::Status => "status",
        }
    }
}

/// Reads a string value. Absent is `None`; present but not a string is an
/// error.
pub fn get_str(map: &Metadata, key: MetadataKey) -> Result<Option<&str>> {
    match map.get(key.as_str()) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ConstructionError::InvalidMetadata(format!(
            "{} must be a string, got {}",
            key.as_str(),
            other
        ))),
    }
}

/// Reads a non-negative integer given as a JSON number or decimal string.
pub fn get_u128(map: &Metadata, key: MetadataKey) -> Result<Option<u128>> {
    let invalid = |v: &Value| {
        ConstructionError::InvalidMetadata(format!(
            "{} must be a non-negative integer, got {}",
            key.as_str(),
            v
        ))
    };
    match map.get(key.as_str()) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Number(n)) => n.as_u64().map(|n| Some(n as u128)).ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse::<u128>().map(Some).map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

/// Like [`get_u128`], bounded to `u64`.
pub fn get_u64(map: &Metadata, key: MetadataKey) -> Result<Option<u64>> {
    match get_u128(map, key)? {
        None => Ok(None),
        Some(v) => u64::try_from(v).map(Some).map_err(|_| {
            ConstructionError::InvalidMetadata(format!("{} exceeds u64: {}", key.as_str(), v))
        }),
    }
}

/// Writes a `u64` as a JSON number.
pub fn insert_u64(map: &mut Metadata, key: MetadataKey, value: u64) {
    map.insert(key.as_str().to_string(), Value::from(value));
}

/// Writes a `u128` as a decimal string.
pub fn insert_u128(map: &mut Metadata, key: MetadataKey, value: u128) {
    map.insert(key.as_str().to_string(), Value::String(value.to_string()));
}

pub fn insert_str(map: &mut Metadata, key: MetadataKey, value: impl Into<String>) {
    map.insert(key.as_str().to_string(), Value::String(value.into()));
}

/// Resolves the requested address encoding. Unset means Bech32; a value of
/// any other type or spelling is an invalid address type.
pub fn address_type(map: Option<&Metadata>) -> Result<AddressType> {
    let key = MetadataKey::AddressType.as_str();
    match map.and_then(|m| m.get(key)) {
        None | Some(Value::Null) => Ok(AddressType::default()),
        Some(Value::String(s)) => Ok(s.parse::<AddressType>()?),
        Some(other) => Err(ConstructionError::InvalidAddressType(other.to_string())),
    }
}
