//! # Chain Configuration & Constants
//!
//! Every Zilliqa-specific magic number the construction workflow relies on
//! lives here. The values are fixed by the chain itself, not by us, so they
//! change only when the chain does.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// The `blockchain` field every request's network identifier must carry.
pub const BLOCKCHAIN: &str = "zilliqa";

/// Network names accepted in the `network` field.
pub const NETWORK_MAINNET: &str = "mainnet";
pub const NETWORK_TESTNET: &str = "testnet";

/// Chain ids baked into the transaction version word.
pub const CHAIN_ID_MAINNET: u32 = 1;
pub const CHAIN_ID_TESTNET: u32 = 333;

/// Transaction message version. Zilliqa has only ever shipped version 1.
pub const MSG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Addresses & Keys
// ---------------------------------------------------------------------------

/// Bech32 human-readable prefix for Zilliqa addresses.
pub const ADDRESS_HRP: &str = "zil";

/// A native address is the trailing 20 bytes of SHA-256(public key).
pub const ADDRESS_LENGTH: usize = 20;

/// Compressed secp256k1 public key length.
pub const COMPRESSED_PUBLIC_KEY_LENGTH: usize = 33;

/// Schnorr signatures are two 32-byte scalars, r || s.
pub const SIGNATURE_LENGTH: usize = 64;

/// Hex length of a transaction hash (SHA-256).
pub const TRANSACTION_HASH_HEX_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Native currency symbol.
pub const CURRENCY_SYMBOL: &str = "ZIL";

/// 1 ZIL = 10^12 Qa. Every amount on the wire is in Qa.
pub const CURRENCY_DECIMALS: u32 = 12;

// ---------------------------------------------------------------------------
// Gas
// ---------------------------------------------------------------------------

/// Gas limit of a plain payment. Contract calls need more and pass it in
/// through the `gas_limit` metadata key.
pub const DEFAULT_GAS_LIMIT: u64 = 50;

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Upper bound for a single chain RPC round-trip when the caller does not
/// supply its own deadline.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Packs a chain id and message version into the 32-bit version word.
pub const fn pack_version(chain_id: u32, msg_version: u32) -> u32 {
    (chain_id << 16) | (msg_version & 0xFFFF)
}

/// Splits a version word into `(chain_id, msg_version)`.
pub const fn unpack_version(version: u32) -> (u32, u32) {
    (version >> 16, version & 0xFFFF)
}

/// Returns the well-known chain id for a network name, if there is one.
pub fn chain_id_for_network(network: &str) -> Option<u32> {
    match network {
        NETWORK_MAINNET => Some(CHAIN_ID_MAINNET),
        NETWORK_TESTNET => Some(CHAIN_ID_TESTNET),
        _ => None,
    }
}

/// The network an adapter instance serves.
///
/// A single process serves exactly one network; requests naming any other
/// network are rejected before any work is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Value expected in `network_identifier.network`.
    pub network: String,
    /// Chain id baked into every transaction version word.
    pub chain_id: u32,
}

impl NetworkConfig {
    /// Builds a config for a network, deriving the chain id from the name
    /// unless an explicit override is given (useful for isolated devnets).
    pub fn new(network: impl Into<String>, chain_id: Option<u32>) -> Option<Self> {
        let network = network.into();
        let chain_id = chain_id.or_else(|| chain_id_for_network(&network))?;
        Some(Self { network, chain_id })
    }

    pub fn mainnet() -> Self {
        Self {
            network: NETWORK_MAINNET.to_string(),
            chain_id: CHAIN_ID_MAINNET,
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: NETWORK_TESTNET.to_string(),
            chain_id: CHAIN_ID_TESTNET,
        }
    }

    /// The version word transactions built for this network carry.
    pub fn version(&self) -> u32 {
        pack_version(self.chain_id, MSG_VERSION)
    }
}

// ---------------------------------------------------------------------------
// Compile-time sanity checks
// ---------------------------------------------------------------------------
