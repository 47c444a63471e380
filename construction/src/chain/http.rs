//! Zilliqa JSON-RPC client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::address::Address;
use crate::chain::rpc::{
    is_account_not_created, BalanceResult, CreateTransactionResult, RpcMethod, RpcRequest,
    RpcResponse,
};
use crate::chain::{AccountMetadata, BroadcastReceipt, ChainClient, ChainRpcError};

/// Talks to one node's JSON-RPC endpoint.
#[derive(Debug)]
pub struct HttpChainClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl HttpChainClient {
    /// Builds a client with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainRpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainRpcError::Transport(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: Value,
    ) -> Result<T, ChainRpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        debug!(?method, id, "chain rpc call");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(?method, %status, "chain rpc http error");
            return Err(ChainRpcError::Transport(format!("HTTP {}", status)));
        }

        let body: RpcResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ChainRpcError::Timeout(self.timeout)
            } else {
                ChainRpcError::InvalidResponse(e.to_string())
            }
        })?;

        if let Some(error) = body.error {
            return Err(ChainRpcError::Rejected {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| ChainRpcError::InvalidResponse("missing result".into()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ChainRpcError {
        if e.is_timeout() {
            ChainRpcError::Timeout(self.timeout)
        } else {
            ChainRpcError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn fetch_account_metadata(
        &self,
        address: &Address,
    ) -> Result<AccountMetadata, ChainRpcError> {
        let result: Result<BalanceResult, _> = self
            .call(RpcMethod::GetBalance, json!([address.to_hex()]))
            .await;

        match result {
            Ok(balance) => Ok(AccountMetadata {
                nonce: balance.nonce,
                balance: balance.balance.parse().map_err(|_| {
                    ChainRpcError::InvalidResponse(format!("balance {:?}", balance.balance))
                })?,
            }),
            // A fresh address has never been written to state. It has
            // nonce 0 and nothing to spend, which is not an error here.
            Err(ChainRpcError::Rejected { message, .. }) if is_account_not_created(&message) =>
            {
                Ok(AccountMetadata::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_fee_estimate(&self) -> Result<u128, ChainRpcError> {
        let price: String = self.call(RpcMethod::GetMinimumGasPrice, json!([""])).await?;
        price
            .parse()
            .map_err(|_| ChainRpcError::InvalidResponse(format!("gas price {:?}", price)))
    }

    async fn broadcast(&self, transaction: &[u8]) -> Result<BroadcastReceipt, ChainRpcError> {
        let payload: Value = serde_json::from_slice(transaction)
            .map_err(|e| ChainRpcError::InvalidRequest(e.to_string()))?;

        let result: CreateTransactionResult = self
            .call(RpcMethod::CreateTransaction, json!([payload]))
            .await?;

        Ok(BroadcastReceipt {
            transaction_id: result.tran_id,
            info: result.info,
        })
    }
}
