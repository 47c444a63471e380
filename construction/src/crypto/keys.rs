//! # Public Keys
//!
//! Zilliqa accounts are secp256k1 keys; the chain identifies a sender by the
//! 33-byte compressed encoding, which is also what the address is hashed
//! from. We validate every key we are handed by decoding it as a curve point
//! and always keep the compressed form, so one key yields exactly one
//! address no matter how the client encoded it.
//!
//! Key bytes are never logged. Hex is public data, but habits matter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::COMPRESSED_PUBLIC_KEY_LENGTH;
use crate::error::ConstructionError;

/// Errors that can occur while decoding a public key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("public key is not valid hex")]
    InvalidHex,

    #[error("public key has {0} bytes, expected 33 (compressed) or 65 (uncompressed)")]
    InvalidLength(usize),

    #[error("public key bytes are not a valid secp256k1 point")]
    InvalidPoint,

    #[error("curve {0} is not supported, expected secp256k1")]
    UnsupportedCurve(CurveType),
}

impl From<KeyError> for ConstructionError {
    fn from(err: KeyError) -> Self {
        ConstructionError::InvalidPublicKey(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Curve & signature tags
// ---------------------------------------------------------------------------

/// Curve tag attached to a public key on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    Secp256k1,
    Secp256r1,
    Edwards25519,
    Tweedle,
    Pallas,
    /// Any tag we do not recognise. Rejected, but parsed so the client gets
    /// a precise error instead of a generic deserialization failure.
    #[serde(other)]
    Other,
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Secp256k1 => "secp256k1",
            Self::Secp256r1 => "secp256r1",
            Self::Edwards25519 => "edwards25519",
            Self::Tweedle => "tweedle",
            Self::Pallas => "pallas",
            Self::Other => "unknown",
        };
        f.write_str(s)
    }
}

/// Signature scheme tag carried by signing payloads and signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    #[serde(rename = "ecdsa")]
    Ecdsa,
    #[serde(rename = "ecdsa_recovery")]
    EcdsaRecovery,
    #[serde(rename = "ed25519")]
    Ed25519,
    /// EC-Schnorr over secp256k1 with SHA-256, as used by Zilliqa.
    #[serde(rename = "schnorr_1")]
    Schnorr1,
    #[serde(rename = "schnorr_poseidon")]
    SchnorrPoseidon,
    #[serde(other, rename = "unknown")]
    Other,
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ecdsa => "ecdsa",
            Self::EcdsaRecovery => "ecdsa_recovery",
            Self::Ed25519 => "ed25519",
            Self::Schnorr1 => "schnorr_1",
            Self::SchnorrPoseidon => "schnorr_poseidon",
            Self::Other => "unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ZilPublicKey
// ---------------------------------------------------------------------------

/// A validated secp256k1 public key in compressed form.
///
/// # Examples
///
/// ```
/// use zil_construction::crypto::ZilPublicKey;
///
/// let pk = ZilPublicKey::from_hex(
///     "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
/// )
/// .unwrap();
/// assert_eq!(pk.as_bytes().len(), 33);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZilPublicKey {
    bytes: [u8; COMPRESSED_PUBLIC_KEY_LENGTH],
}

impl ZilPublicKey {
    /// Decodes a compressed (33-byte) or uncompressed (65-byte) key and
    /// normalises it to the compressed encoding.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 33 && bytes.len() != 65 {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let point =
            secp256k1::PublicKey::from_slice(bytes).map_err(|_| KeyError::InvalidPoint)?;
        Ok(Self {
            bytes: point.serialize(),
        })
    }

    /// Parses a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let trimmed = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|_| KeyError::InvalidHex)?;
        Self::try_from_slice(&bytes)
    }

    /// Parses a hex key together with its declared curve.
    pub fn from_hex_with_curve(s: &str, curve: CurveType) -> Result<Self, KeyError> {
        if curve != CurveType::Secp256k1 {
            return Err(KeyError::UnsupportedCurve(curve));
        }
        Self::from_hex(s)
    }

    /// The compressed SEC1 encoding.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Lowercase hex of the compressed encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl FromStr for ZilPublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ZilPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ZilPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZilPublicKey({})", &self.to_hex()[..16])
    }
}

impl Serialize for ZilPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ZilPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Compressed generator point (secret scalar 1).
    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_UNCOMPRESSED: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
                                  483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    #[test]
    fn parses_compressed_key() {
        let pk = ZilPublicKey::from_hex(G_COMPRESSED).unwrap();
        assert_eq!(pk.to_hex(), G_COMPRESSED);
    }

    #[test]
    fn accepts_0x_prefix_and_uppercase() {
        let upper = format!("0x{}", G_COMPRESSED.to_uppercase());
        let pk = ZilPublicKey::from_hex(&upper).unwrap();
        assert_eq!(pk.to_hex(), G_COMPRESSED);
    }

    #[test]
    fn uncompressed_key_is_normalised() {
        let pk = ZilPublicKey::from_hex(G_UNCOMPRESSED).unwrap();
        assert_eq!(pk.to_hex(), G_COMPRESSED);
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(ZilPublicKey::from_hex("zz"), Err(KeyError::InvalidHex));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            ZilPublicKey::from_hex(&"02".repeat(32)),
            Err(KeyError::InvalidLength(32))
        );
    }

    #[test]
    fn rejects_invalid_prefix_byte() {
        let bad = format!("05{}", &G_COMPRESSED[2..]);
        assert_eq!(ZilPublicKey::from_hex(&bad), Err(KeyError::InvalidPoint));
    }

    #[test]
    fn rejects_foreign_curve() {
        let err = ZilPublicKey::from_hex_with_curve(G_COMPRESSED, CurveType::Edwards25519)
            .unwrap_err();
        assert_eq!(err, KeyError::UnsupportedCurve(CurveType::Edwards25519));
    }

    #[test]
    fn key_error_maps_to_invalid_public_key() {
        let err: ConstructionError = KeyError::InvalidPoint.into();
        assert!(matches!(err, ConstructionError::InvalidPublicKey(_)));
    }

    #[test]
    fn curve_type_wire_names() {
        let curve: CurveType = serde_json::from_str("\"secp256k1\"").unwrap();
        assert_eq!(curve, CurveType::Secp256k1);
        let unknown: CurveType = serde_json::from_str("\"bls12381\"").unwrap();
        assert_eq!(unknown, CurveType::Other);
    }

    #[test]
    fn schnorr_wire_name_keeps_underscore() {
        let json = serde_json::to_string(&SignatureType::Schnorr1).unwrap();
        assert_eq!(json, "\"schnorr_1\"");
        let parsed: SignatureType = serde_json::from_str("\"schnorr_1\"").unwrap();
        assert_eq!(parsed, SignatureType::Schnorr1);
    }

    #[test]
    fn serde_uses_hex_string() {
        let pk = ZilPublicKey::from_hex(G_COMPRESSED).unwrap();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", G_COMPRESSED));
        let back: ZilPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn debug_is_truncated() {
        let pk = ZilPublicKey::from_hex(G_COMPRESSED).unwrap();
        assert_eq!(format!("{:?}", pk), "ZilPublicKey(0279be667ef9dcbb)");
    }
}
