//! Fixtures shared by unit tests.

use secp256k1::{Secp256k1, SecretKey};

use crate::address::Address;
use crate::crypto::ZilPublicKey;
use crate::transaction::{NativeTransaction, TransactionCodec};

/// Public key of the secret scalar `[seed; 32]`. Seed 1 is not the
/// generator; use [`GENERATOR_KEY`] for the known vector.
pub fn public_key(seed: u8) -> ZilPublicKey {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[seed; 32]).expect("seed below curve order");
    let public = secp256k1::PublicKey::from_secret_key(&secp, &secret);
    ZilPublicKey::try_from_slice(&public.serialize()).expect("valid point")
}

/// Compressed generator point (secret scalar 1).
pub const GENERATOR_KEY: &str =
    "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

/// An unsigned transfer from key `seed` to a fixed recipient.
pub fn unsigned_transfer(
    codec: &TransactionCodec,
    seed: u8,
    nonce: u64,
    gas_price: u128,
) -> NativeTransaction {
    NativeTransaction {
        id: None,
        version: codec.version(),
        nonce,
        to_addr: Address::from_bytes([0xab; 20]),
        amount: 1_000_000_000_000,
        pub_key: public_key(seed),
        gas_price,
        gas_limit: 50,
        code: String::new(),
        data: String::new(),
        signature: None,
        priority: false,
    }
}

/// Same as [`unsigned_transfer`] with a placeholder signature and the hash
/// assigned as `id`.
pub fn signed_transfer(
    codec: &TransactionCodec,
    seed: u8,
    nonce: u64,
    gas_price: u128,
) -> NativeTransaction {
    let mut tx = unsigned_transfer(codec, seed, nonce, gas_price);
    tx.signature = Some([seed; 64]);
    tx.id = Some(codec.hash(&tx).expect("hashable"));
    tx
}
