//! # Construction Workflow
//!
//! [`ConstructionService`] exposes the eight Construction API stages:
//!
//! ```text
//! derive → preprocess → metadata → payloads → parse/combine → hash → submit
//! ```
//!
//! The service holds no per-transaction state. Everything a later stage
//! needs travels back to the client, either as metadata or inside the
//! unsigned-transaction envelope. Only `metadata` and `submit` touch the
//! outside world, through the [`ChainClient`] and the [`SubmissionSink`];
//! both take a [`RequestContext`] bounding those calls.
//!
//! Every stage checks the network identifier first, then validates its own
//! input, and only then calls a collaborator.

mod construct;
mod context;
mod finalize;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

pub use context::RequestContext;

use crate::chain::ChainClient;
use crate::config::{NetworkConfig, BLOCKCHAIN, DEFAULT_RPC_TIMEOUT};
use crate::error::{ConstructionError, Result};
use crate::mempool::SubmissionSink;
use crate::transaction::TransactionCodec;
use crate::types::NetworkIdentifier;

/// The Construction API for one Zilliqa network.
///
/// Cheap to share: wrap it in an `Arc` and call stages from any task.
pub struct ConstructionService {
    network: NetworkConfig,
    codec: TransactionCodec,
    chain: Option<Arc<dyn ChainClient>>,
    sink: Arc<dyn SubmissionSink>,
    broadcast: bool,
    rpc_timeout: Duration,
}

impl fmt::Debug for ConstructionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionService")
            .field("network", &self.network)
            .field("online", &self.chain.is_some())
            .field("broadcast", &self.broadcast)
            .field("rpc_timeout", &self.rpc_timeout)
            .finish()
    }
}

impl ConstructionService {
    /// An offline service: every stage that needs the chain node returns
    /// [`ConstructionError::Offline`]. Attach a node with
    /// [`with_chain_client`](Self::with_chain_client).
    pub fn new(network: NetworkConfig, sink: Arc<dyn SubmissionSink>) -> Self {
        Self {
            codec: TransactionCodec::new(network.chain_id),
            network,
            chain: None,
            sink,
            broadcast: false,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    pub fn with_chain_client(mut self, chain: Arc<dyn ChainClient>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Forward newly accepted transactions to the node on submit.
    pub fn with_broadcast(mut self, enabled: bool) -> Self {
        self.broadcast = enabled;
        self
    }

    /// Deadline used by [`request_context`](Self::request_context).
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn codec(&self) -> &TransactionCodec {
        &self.codec
    }

    pub fn is_online(&self) -> bool {
        self.chain.is_some()
    }

    pub fn broadcasts(&self) -> bool {
        self.broadcast
    }

    /// A fresh context with the configured RPC deadline.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new(self.rpc_timeout)
    }

    fn check_network(&self, id: &NetworkIdentifier) -> Result<()> {
        if id.blockchain != BLOCKCHAIN || id.network != self.network.network {
            warn!(
                blockchain = %id.blockchain,
                network = %id.network,
                "request for unsupported network"
            );
            return Err(ConstructionError::UnsupportedNetwork(format!(
                "{}/{}",
                id.blockchain, id.network
            )));
        }
        Ok(())
    }

    fn chain(&self) -> Result<&Arc<dyn ChainClient>> {
        self.chain.as_ref().ok_or(ConstructionError::Offline)
    }
}
