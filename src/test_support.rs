// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    rpc::types::TransactionRequest,
    sol_types::{SolCall, SolValue},
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::blockchain::{
    erc20::IERC20, ChainGateway, GatewayError, NetworkConfig, PendingTx, RelayEnvelope, TxReceipt,
};
use crate::session::{local::signer_from_hex, BrokerConfig, LocalKeyBroker, RelaySigner};
use crate::transfer::{ControllerSettings, TransferController};

/// Anvil/Hardhat development account #0.
pub const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn dev_broker() -> LocalKeyBroker {
    LocalKeyBroker::new(
        BrokerConfig {
            network: NetworkConfig::polygon(None),
            provider_key: None,
        },
        signer_from_hex(DEV_KEY).unwrap(),
    )
}

/// How the fake chain answers `await_receipt`.
#[derive(Debug, Clone)]
pub enum ReceiptOutcome {
    Mined { success: bool },
    Error(GatewayError),
}

/// Chain fake answering ERC-20 reads by selector and recording submissions.
pub struct FakeGateway {
    network: NetworkConfig,
    symbol: String,
    decimals: u8,
    balance: Mutex<U256>,
    reads_failing: AtomicBool,
    balance_reads: AtomicUsize,
    calls: AtomicUsize,
    submit_error: Mutex<Option<GatewayError>>,
    submitted: Mutex<Vec<(RelayEnvelope, Address)>>,
    receipt: Mutex<ReceiptOutcome>,
    gate: Mutex<Option<Arc<Notify>>>,
    awaiting: Notify,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            network: NetworkConfig::polygon(None),
            symbol: "USDC".to_string(),
            decimals: 6,
            balance: Mutex::new(U256::ZERO),
            reads_failing: AtomicBool::new(false),
            balance_reads: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            submit_error: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            receipt: Mutex::new(ReceiptOutcome::Mined { success: true }),
            gate: Mutex::new(None),
            awaiting: Notify::new(),
        }
    }

    pub fn with_token(mut self, symbol: &str, decimals: u8) -> Self {
        self.symbol = symbol.to_string();
        self.decimals = decimals;
        self
    }

    pub fn set_balance(&self, balance: U256) {
        *self.balance.lock().unwrap() = balance;
    }

    pub fn set_reads_failing(&self, failing: bool) {
        self.reads_failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_receipt(&self, outcome: ReceiptOutcome) {
        *self.receipt.lock().unwrap() = outcome;
    }

    pub fn fail_next_submit(&self, error: GatewayError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    /// Hold every `await_receipt` until the returned handle is notified.
    pub fn gate_receipts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once some caller is blocked in `await_receipt`.
    pub async fn wait_until_awaiting(&self) {
        self.awaiting.notified().await;
    }

    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    /// Every `call`, including ones that failed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn submitted(&self) -> Vec<(RelayEnvelope, Address)> {
        self.submitted.lock().unwrap().clone()
    }
}

fn tx_hash(index: usize) -> B256 {
    B256::from(U256::from(index as u64 + 1))
}

#[async_trait]
impl ChainGateway for FakeGateway {
    async fn call(&self, _contract: Address, data: Bytes) -> Result<Bytes, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reads_failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Rpc("connection refused".to_string()));
        }

        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| GatewayError::Reverted("empty calldata".to_string()))?;

        let encoded = if selector == IERC20::balanceOfCall::SELECTOR {
            self.balance_reads.fetch_add(1, Ordering::SeqCst);
            let balance = *self.balance.lock().unwrap();
            balance.abi_encode()
        } else if selector == IERC20::decimalsCall::SELECTOR {
            U256::from(self.decimals).abi_encode()
        } else if selector == IERC20::symbolCall::SELECTOR {
            self.symbol.clone().abi_encode()
        } else {
            return Err(GatewayError::Reverted("unknown selector".to_string()));
        };
        Ok(encoded.into())
    }

    async fn submit(
        &self,
        envelope: &RelayEnvelope,
        signer: &dyn RelaySigner,
    ) -> Result<PendingTx, GatewayError> {
        if let Some(error) = self.submit_error.lock().unwrap().take() {
            return Err(error);
        }

        let index = self.submit_count();
        let tx = TransactionRequest::default()
            .to(envelope.factory())
            .value(envelope.native_value())
            .input(envelope.calldata().into())
            .nonce(index as u64)
            .gas_limit(200_000)
            .max_fee_per_gas(60_000_000_000)
            .max_priority_fee_per_gas(30_000_000_000);
        signer
            .sign_transaction(tx)
            .await
            .map_err(GatewayError::Signing)?;

        self.submitted
            .lock()
            .unwrap()
            .push((envelope.clone(), signer.address()));

        Ok(PendingTx {
            tx_hash: tx_hash(index),
            submitted_at: Utc::now(),
        })
    }

    async fn await_receipt(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError> {
        self.awaiting.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.receipt.lock().unwrap().clone() {
            ReceiptOutcome::Mined { success } => Ok(TxReceipt {
                tx_hash: pending.tx_hash,
                block_number: 1,
                gas_used: 60_000,
                success,
            }),
            ReceiptOutcome::Error(error) => Err(error),
        }
    }

    async fn block_number(&self) -> Result<u64, GatewayError> {
        if self.reads_failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Rpc("connection refused".to_string()));
        }
        Ok(1)
    }

    fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

/// Router state over a [`FakeGateway`] holding 2.5 USDC and the dev broker.
pub fn test_state() -> (Arc<FakeGateway>, crate::state::AppState) {
    let gateway = Arc::new(FakeGateway::new());
    gateway.set_balance(U256::from(2_500_000u64));
    let controller = Arc::new(TransferController::new(
        ControllerSettings::default(),
        gateway.clone(),
        Arc::new(dev_broker()),
    ));
    (gateway.clone(), crate::state::AppState::new(controller, gateway))
}
