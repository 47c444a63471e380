//! # Zilliqa JSON-RPC Definitions
//!
//! Request/response envelopes and the typed payloads of the node methods
//! the construction workflow calls. The transport lives in
//! [`HttpChainClient`](super::HttpChainClient).
//!
//! ## Method Index
//!
//! | Method               | Params                 | Result                          |
//! |----------------------|------------------------|---------------------------------|
//! | `GetBalance`         | `[hex address]`        | `{"balance": "…", "nonce": n}`  |
//! | `GetMinimumGasPrice` | `[""]`                 | `"2000000000"`                  |
//! | `CreateTransaction`  | `[transaction object]` | `{"Info": "…", "TranID": "…"}`  |

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node methods used by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    GetBalance,
    GetMinimumGasPrice,
    CreateTransaction,
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: RpcMethod,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: RpcMethod, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response. Exactly one of `result` or `error` is set by a
/// conforming node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// `GetBalance` on an address that never received funds.
    pub fn is_account_not_created(&self) -> bool {
        is_account_not_created(&self.message)
    }
}

/// Whether a node error message says the account has no state yet.
pub fn is_account_not_created(message: &str) -> bool {
    message.to_ascii_lowercase().contains("not created")
}

// ---------------------------------------------------------------------------
// Typed payloads
// ---------------------------------------------------------------------------

/// Result of `GetBalance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResult {
    /// Qa, as a decimal string.
    pub balance: String,
    pub nonce: u64,
}

/// Result of `CreateTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionResult {
    #[serde(rename = "Info", default)]
    pub info: Option<String>,
    #[serde(rename = "TranID")]
    pub tran_id: String,
}
