//! # Chain Node Collaborator
//!
//! The workflow talks to a Zilliqa node for exactly three things: an
//! account's nonce and balance, the current minimum gas price, and
//! broadcasting a signed transaction. [`ChainClient`] is that seam.
//!
//! Two implementations ship with the crate:
//!
//! - [`HttpChainClient`]: Zilliqa JSON-RPC over HTTP.
//! - [`InMemoryChainClient`]: fixed state, for tests and offline demos.

pub mod http;
pub mod memory;
pub mod rpc;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

pub use http::HttpChainClient;
pub use memory::InMemoryChainClient;

/// Failures talking to the chain node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainRpcError {
    /// Connection refused, reset, DNS failure, 5xx, and the like.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller gave up before the node answered.
    #[error("request cancelled")]
    Cancelled,

    /// The node understood the request and refused it.
    #[error("node rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// The request could not be built from what we were given.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The node answered with something we cannot interpret.
    #[error("invalid node response: {0}")]
    InvalidResponse(String),
}

impl ChainRpcError {
    /// Transient conditions are worth a retry; anything about the content
    /// of the request or response is not.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Cancelled
        )
    }
}

/// Account state the metadata stage needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    /// Nonce of the last transaction the account sent. The next
    /// transaction uses `nonce + 1`.
    pub nonce: u64,
    /// Balance in Qa.
    pub balance: u128,
}

/// What the node says after accepting a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReceipt {
    /// Node-assigned transaction id.
    pub transaction_id: String,
    /// Free-form routing information, e.g. which shard got it.
    pub info: Option<String>,
}

/// The chain node, seen from the construction workflow.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn fetch_account_metadata(
        &self,
        address: &Address,
    ) -> Result<AccountMetadata, ChainRpcError>;

    /// Minimum gas price in Qa.
    async fn fetch_fee_estimate(&self) -> Result<u128, ChainRpcError>;

    /// Sends a serialized signed transaction to the node.
    async fn broadcast(&self, transaction: &[u8]) -> Result<BroadcastReceipt, ChainRpcError>;
}
