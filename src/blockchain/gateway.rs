// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain RPC boundary.
//!
//! [`ChainGateway`] is everything the transfer pipeline needs from the chain:
//! read-only calls, submission of a signed relay transaction, and waiting for
//! its receipt. [`RpcGateway`] implements it over alloy's HTTP provider.

use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::{Address, Bytes, TxHash},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::relay::RelayEnvelope;
use super::types::{NetworkConfig, TxReceipt};
use crate::session::{RelaySigner, SessionError};

/// HTTP provider type for Polygon (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Default bound on waiting for a receipt.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default interval between receipt polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Polygon enforces a minimum tip; lower tips sit in the mempool.
const POLYGON_PRIORITY_FEE: u128 = 30_000_000_000; // 30 gwei

/// Used when the latest block carries no base fee.
const FALLBACK_BASE_FEE: u128 = 30_000_000_000; // 30 gwei

/// Extra gas on top of the estimate, in percent.
const GAS_LIMIT_HEADROOM_PERCENT: u64 = 20;

/// A broadcast transaction whose outcome is not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTx {
    pub tx_hash: TxHash,
    pub submitted_at: DateTime<Utc>,
}

/// Read and write access to the chain.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Execute a read-only call and return the raw return data.
    async fn call(&self, contract: Address, data: Bytes) -> Result<Bytes, GatewayError>;

    /// Populate, sign (through `signer`) and broadcast the relay transaction.
    async fn submit(
        &self,
        envelope: &RelayEnvelope,
        signer: &dyn RelaySigner,
    ) -> Result<PendingTx, GatewayError>;

    /// Wait until the transaction is mined or the configured bound elapses.
    async fn await_receipt(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError>;

    /// Current chain head; used as a reachability probe.
    async fn block_number(&self) -> Result<u64, GatewayError>;

    /// Network this gateway talks to.
    fn network(&self) -> &NetworkConfig;
}

/// Receipt polling parameters.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolling {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_RECEIPT_TIMEOUT,
            interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }
}

/// JSON-RPC gateway over HTTP.
pub struct RpcGateway {
    network: NetworkConfig,
    provider: HttpProvider,
    polling: ReceiptPolling,
}

impl RpcGateway {
    /// Create a gateway for the given network.
    pub fn new(network: NetworkConfig, polling: ReceiptPolling) -> Result<Self, GatewayError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| GatewayError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            network,
            provider,
            polling,
        })
    }

    /// Get current gas prices from the network.
    async fn gas_prices(&self) -> Result<(u128, u128), GatewayError> {
        let block = self
            .provider
            .get_block_by_number(alloy::eips::BlockNumberOrTag::Latest)
            .await
            .map_err(|e| GatewayError::Rpc(format!("Failed to get block: {}", e)))?
            .ok_or_else(|| GatewayError::Rpc("No latest block".to_string()))?;

        let base_fee: u128 = block
            .header
            .base_fee_per_gas
            .map(|f| f as u128)
            .unwrap_or(FALLBACK_BASE_FEE);

        // Max fee = 2 * base_fee + priority_fee (allows for base fee increase)
        let max_fee = base_fee
            .saturating_mul(2)
            .saturating_add(POLYGON_PRIORITY_FEE);

        Ok((max_fee, POLYGON_PRIORITY_FEE))
    }

    async fn fetch_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, GatewayError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| GatewayError::Rpc(format!("Failed to get receipt: {}", e)))?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash,
            block_number: r.block_number.unwrap_or(0),
            gas_used: r.gas_used,
            success: r.status(),
        }))
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn call(&self, contract: Address, data: Bytes) -> Result<Bytes, GatewayError> {
        let tx = TransactionRequest::default().to(contract).input(data.into());
        self.provider
            .call(tx)
            .await
            .map_err(|e| classify_rpc_error("eth_call failed", e.to_string()))
    }

    async fn submit(
        &self,
        envelope: &RelayEnvelope,
        signer: &dyn RelaySigner,
    ) -> Result<PendingTx, GatewayError> {
        let from = signer.address();
        let tx = TransactionRequest::default()
            .from(from)
            .to(envelope.factory())
            .value(envelope.native_value())
            .input(envelope.calldata().into());

        let estimate = self
            .provider
            .estimate_gas(tx.clone())
            .await
            .map_err(|e| classify_rpc_error("Gas estimation failed", e.to_string()))?;
        let gas_limit = with_headroom(estimate);

        let nonce = self
            .provider
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(|e| GatewayError::Rpc(format!("Failed to get nonce: {}", e)))?;

        let (max_fee_per_gas, priority_fee) = self.gas_prices().await?;

        let tx = tx
            .nonce(nonce)
            .gas_limit(gas_limit)
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(priority_fee);

        debug!(
            from = %from,
            factory = %envelope.factory(),
            calls = envelope.calls().len(),
            nonce,
            gas_limit,
            "Signing relay transaction"
        );

        let raw = signer
            .sign_transaction(tx)
            .await
            .map_err(GatewayError::Signing)?;

        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| classify_rpc_error("Failed to send", e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        info!(
            tx_hash = %tx_hash,
            explorer_url = %self.network.tx_url(tx_hash),
            "Relay transaction broadcast"
        );

        Ok(PendingTx {
            tx_hash,
            submitted_at: Utc::now(),
        })
    }

    async fn await_receipt(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError> {
        let poll = async {
            loop {
                match self.fetch_receipt(pending.tx_hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    Err(e) => {
                        warn!(tx_hash = %pending.tx_hash, error = %e, "Receipt poll failed, will retry");
                    }
                }
                tokio::time::sleep(self.polling.interval).await;
            }
        };

        tokio::time::timeout(self.polling.timeout, poll)
            .await
            .map_err(|_| GatewayError::ReceiptTimeout(self.polling.timeout))
    }

    async fn block_number(&self) -> Result<u64, GatewayError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| GatewayError::Rpc(e.to_string()))
    }

    fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

fn with_headroom(estimate: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(GAS_LIMIT_HEADROOM_PERCENT) / 100)
}

/// Separate execution reverts (the call itself is bad) from transport trouble.
fn classify_rpc_error(context: &str, message: String) -> GatewayError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("execution reverted") || lowered.contains("out of gas") {
        GatewayError::Reverted(format!("{context}: {message}"))
    } else {
        GatewayError::Rpc(format!("{context}: {message}"))
    }
}

/// Errors that can occur during chain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Signing failed: {0}")]
    Signing(SessionError),

    #[error("No receipt after {0:?}")]
    ReceiptTimeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_adds_twenty_percent() {
        assert_eq!(with_headroom(100_000), 120_000);
        assert_eq!(with_headroom(0), 0);
        assert_eq!(with_headroom(u64::MAX), u64::MAX);
    }

    #[test]
    fn reverts_are_classified() {
        assert!(matches!(
            classify_rpc_error("Gas estimation failed", "server returned an error response: error code 3: execution reverted: ERC20: transfer amount exceeds balance".into()),
            GatewayError::Reverted(_)
        ));
        assert!(matches!(
            classify_rpc_error("Failed to send", "error sending request for url".into()),
            GatewayError::Rpc(_)
        ));
    }

    #[test]
    fn rejects_invalid_rpc_url() {
        let mut network = NetworkConfig::polygon(None);
        network.rpc_url = "not a url".to_string();
        assert!(matches!(
            RpcGateway::new(network, ReceiptPolling::default()),
            Err(GatewayError::InvalidRpcUrl(_))
        ));
    }

    #[tokio::test]
    async fn builds_for_valid_url() {
        let gateway =
            RpcGateway::new(NetworkConfig::polygon(None), ReceiptPolling::default()).unwrap();
        assert_eq!(gateway.network().chain_id, 137);
    }
}
