//! # Zilliqa Addresses
//!
//! An address is the trailing 20 bytes of the SHA-256 digest of the
//! sender's compressed public key:
//!
//! ```text
//! public_key (33 bytes, compressed secp256k1)
//!     -> SHA-256(public_key) -> 32 bytes
//!     -> digest[12..32]       -> 20-byte address
//! ```
//!
//! The same 20 bytes have two textual forms. The raw form is 40 hex
//! characters (we emit lowercase without a prefix and accept `0x` and any
//! case). The user-facing form is Bech32 with the `zil` prefix, which
//! catches typos before money moves.

use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ADDRESS_HRP, ADDRESS_LENGTH};
use crate::crypto::{sha256_array, ZilPublicKey};
use crate::error::ConstructionError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding or encoding an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    /// The hex form is not valid hex.
    #[error("invalid hex address: {0}")]
    InvalidHex(String),

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength { expected: usize, got: usize },

    /// An encoding other than `hex` or `bech32` was requested.
    #[error("unknown address type '{0}', expected 'hex' or 'bech32'")]
    UnknownAddressType(String),
}

impl From<AddressError> for ConstructionError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::UnknownAddressType(t) => ConstructionError::InvalidAddressType(t),
            other => ConstructionError::MalformedAddress(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// AddressType
// ---------------------------------------------------------------------------

/// The textual encodings an address can be rendered in.
///
/// This is the single source of the `type` literals accepted in derive
/// metadata; nothing else in the crate spells them out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Hex,
    #[default]
    Bech32,
}

impl AddressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Bech32 => "bech32",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex" => Ok(Self::Hex),
            "bech32" => Ok(Self::Bech32),
            other => Err(AddressError::UnknownAddressType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte Zilliqa account address.
///
/// # Examples
///
/// ```
/// use zil_construction::address::Address;
/// use zil_construction::crypto::ZilPublicKey;
///
/// let pk = ZilPublicKey::from_hex(
///     "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
/// )
/// .unwrap();
/// let addr = Address::from_public_key(&pk);
/// assert_eq!(addr.to_bech32(), "zil198jk9ae53ry29wuah3tspvmp649ekp250ajt0a");
/// assert_eq!(Address::decode(&addr.to_hex()).unwrap(), addr);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derives the address owned by a public key. Deterministic.
    pub fn from_public_key(pk: &ZilPublicKey) -> Self {
        let digest = sha256_array(pk.as_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// 40 lowercase hex characters, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Mixed-case checksummed hex, no prefix. This is the form the node
    /// expects in `toAddr`: a letter is uppercased when bit `255 - 6 * i`
    /// of SHA-256(address) is set, `i` being its position.
    pub fn to_checksum_hex(&self) -> String {
        let lower = self.to_hex();
        let digest = sha256_array(&self.0);
        lower
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let bit = 255 - 6 * i;
                let set = digest[31 - bit / 8] & (1u8 << (bit % 8)) != 0;
                if c.is_ascii_alphabetic() && set {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }

    /// Bech32 with the `zil` prefix.
    pub fn to_bech32(&self) -> String {
        bech32::encode::<Bech32>(zil_hrp(), &self.0)
            .expect("encoding a 20-byte payload should never fail")
    }

    /// Renders the address in the requested encoding.
    pub fn encode(&self, address_type: AddressType) -> String {
        match address_type {
            AddressType::Hex => self.to_hex(),
            AddressType::Bech32 => self.to_bech32(),
        }
    }

    /// Parses either encoding. Strings starting with `zil1` (any case) are
    /// treated as Bech32, everything else as hex with an optional `0x`.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        let is_bech32 = trimmed
            .get(..4)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("zil1"));
        if is_bech32 {
            Self::from_bech32(trimmed)
        } else {
            Self::from_hex(trimmed)
        }
    }

    /// Parses a Bech32 address, validating HRP, checksum and length.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        if hrp != zil_hrp() {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        Self::from_slice(&data)
    }

    /// Parses a 40-character hex address, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let trimmed = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let data = hex::decode(trimmed).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&data)
    }

    fn from_slice(data: &[u8]) -> Result<Self, AddressError> {
        if data.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidDataLength {
                expected: ADDRESS_LENGTH,
                got: data.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(data);
        Ok(Self(bytes))
    }
}

fn zil_hrp() -> Hrp {
    Hrp::parse_unchecked(ADDRESS_HRP)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
