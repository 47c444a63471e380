//! In-memory chain client.
//!
//! Holds account state and a gas price set by the caller and records every
//! broadcast. Used by tests and local development.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::address::Address;
use crate::chain::{AccountMetadata, BroadcastReceipt, ChainClient, ChainRpcError};
use crate::crypto::sha256;

/// A chain node that lives in process memory.
#[derive(Debug, Default)]
pub struct InMemoryChainClient {
    accounts: DashMap<Address, AccountMetadata>,
    gas_price: RwLock<u128>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
    next_broadcast_error: Mutex<Option<ChainRpcError>>,
    latency: Option<Duration>,
    account_lookups: AtomicUsize,
    fee_lookups: AtomicUsize,
}

impl InMemoryChainClient {
    pub fn new(gas_price: u128) -> Self {
        Self {
            gas_price: RwLock::new(gas_price),
            ..Default::default()
        }
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_account(&self, address: Address, nonce: u64, balance: u128) {
        self.accounts.insert(address, AccountMetadata { nonce, balance });
    }

    pub fn set_gas_price(&self, gas_price: u128) {
        *self.gas_price.write() = gas_price;
    }

    /// The next broadcast fails with `error`.
    pub fn fail_next_broadcast(&self, error: ChainRpcError) {
        *self.next_broadcast_error.lock() = Some(error);
    }

    /// Bytes of every successful broadcast, oldest first.
    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.broadcasts.lock().clone()
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::Relaxed)
    }

    pub fn fee_lookups(&self) -> usize {
        self.fee_lookups.load(Ordering::Relaxed)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ChainClient for InMemoryChainClient {
    async fn fetch_account_metadata(
        &self,
        address: &Address,
    ) -> Result<AccountMetadata, ChainRpcError> {
        self.account_lookups.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        Ok(self
            .accounts
            .get(address)
            .map(|entry| *entry.value())
            .unwrap_or_default())
    }

    async fn fetch_fee_estimate(&self) -> Result<u128, ChainRpcError> {
        self.fee_lookups.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        Ok(*self.gas_price.read())
    }

    async fn broadcast(&self, transaction: &[u8]) -> Result<BroadcastReceipt, ChainRpcError> {
        self.simulate_latency().await;
        if let Some(error) = self.next_broadcast_error.lock().take() {
            return Err(error);
        }
        self.broadcasts.lock().push(transaction.to_vec());
        Ok(BroadcastReceipt {
            transaction_id: hex::encode(sha256(transaction)),
            info: Some("accepted by in-memory node".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_account_is_empty() {
        let client = InMemoryChainClient::new(1);
        let meta = client
            .fetch_account_metadata(&Address::from_bytes([4u8; 20]))
            .await
            .unwrap();
        assert_eq!(meta, AccountMetadata::default());
        assert_eq!(client.account_lookups(), 1);
    }

    #[tokio::test]
    async fn returns_configured_state() {
        let client = InMemoryChainClient::new(1_000);
        let address = Address::from_bytes([4u8; 20]);
        client.set_account(address, 7, 99);
        client.set_gas_price(2_000);

        let meta = client.fetch_account_metadata(&address).await.unwrap();
        assert_eq!((meta.nonce, meta.balance), (7, 99));
        assert_eq!(client.fetch_fee_estimate().await.unwrap(), 2_000);
        assert_eq!(client.fee_lookups(), 1);
    }

    #[tokio::test]
    async fn queued_failure_applies_once() {
        let client = InMemoryChainClient::new(1);
        client.fail_next_broadcast(ChainRpcError::Transport("reset".into()));

        assert!(client.broadcast(b"{}").await.is_err());
        assert!(client.broadcast(b"{}").await.is_ok());
        assert_eq!(client.broadcasts().len(), 1);
    }
}
