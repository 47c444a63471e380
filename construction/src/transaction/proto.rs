//! Protobuf messages the node hashes and verifies signatures over.
//!
//! Field numbers and labels follow `ZilliqaMessage.proto`. Every scalar is
//! proto2 `optional` with explicit presence, so a zero nonce or gas limit is
//! still written. Amounts are 16-byte big-endian `uint128` wrapped in a
//! `ByteArray`.

use prost::Message;

use crate::transaction::native::NativeTransaction;

/// Width of a serialized `uint128` amount.
const UINT128_LEN: usize = 16;

#[derive(Clone, PartialEq, Message)]
pub struct ByteArray {
    #[prost(bytes = "vec", required, tag = "1")]
    pub data: Vec<u8>,
}

impl ByteArray {
    fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    fn uint128(value: u128) -> Self {
        let bytes: [u8; UINT128_LEN] = value.to_be_bytes();
        Self::new(bytes)
    }
}

/// The signed part of a transaction. The signature, the id and the
/// priority flag live outside it.
#[derive(Clone, PartialEq, Message)]
pub struct ProtoTransactionCoreInfo {
    #[prost(uint32, optional, tag = "1")]
    pub version: Option<u32>,
    #[prost(uint64, optional, tag = "2")]
    pub nonce: Option<u64>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub toaddr: Option<Vec<u8>>,
    #[prost(message, optional, tag = "4")]
    pub senderpubkey: Option<ByteArray>,
    #[prost(message, optional, tag = "5")]
    pub amount: Option<ByteArray>,
    #[prost(message, optional, tag = "6")]
    pub gasprice: Option<ByteArray>,
    #[prost(uint64, optional, tag = "7")]
    pub gaslimit: Option<u64>,
    #[prost(bytes = "vec", optional, tag = "8")]
    pub code: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "9")]
    pub data: Option<Vec<u8>>,
}

impl From<&NativeTransaction> for ProtoTransactionCoreInfo {
    fn from(tx: &NativeTransaction) -> Self {
        // Empty code and data are left unset, not written as empty bytes.
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.as_bytes().to_vec());

        Self {
            version: Some(tx.version),
            nonce: Some(tx.nonce),
            toaddr: Some(tx.to_addr.as_bytes().to_vec()),
            senderpubkey: Some(ByteArray::new(tx.pub_key.as_bytes().to_vec())),
            amount: Some(ByteArray::uint128(tx.amount)),
            gasprice: Some(ByteArray::uint128(tx.gas_price)),
            gaslimit: Some(tx.gas_limit),
            code: non_empty(&tx.code),
            data: non_empty(&tx.data),
        }
    }
}

impl ProtoTransactionCoreInfo {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_what_it_encodes() {
        let core = ProtoTransactionCoreInfo {
            version: Some(65_537),
            nonce: Some(0),
            toaddr: Some(vec![0xaa; 20]),
            senderpubkey: Some(ByteArray::new(vec![2; 33])),
            amount: Some(ByteArray::uint128(0)),
            gasprice: Some(ByteArray::uint128(u128::MAX)),
            gaslimit: Some(0),
            code: None,
            data: Some(b"{}".to_vec()),
        };
        let decoded = ProtoTransactionCoreInfo::decode(core.to_bytes().as_slice()).unwrap();
        assert_eq!(decoded, core);
    }

    #[test]
    fn zero_scalars_keep_their_tags() {
        let core = ProtoTransactionCoreInfo {
            nonce: Some(0),
            gaslimit: Some(0),
            ..Default::default()
        };
        // nonce (field 2, varint) then gaslimit (field 7, varint), both 0.
        assert_eq!(core.to_bytes(), vec![0x10, 0x00, 0x38, 0x00]);
    }

    #[test]
    fn amounts_are_sixteen_bytes() {
        let amount = ByteArray::uint128(1_000_000_000_000);
        assert_eq!(amount.data.len(), UINT128_LEN);
        assert_eq!(hex::encode(&amount.data), "0000000000000000000000e8d4a51000");
    }
}
