// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The transfer state machine.
//!
//! ```text
//! Idle -> Validating -> Encoding -> Submitting -> AwaitingReceipt -> Confirmed
//!              \            \            \               \
//!               +------------+------------+---------------+--> Failed
//! ```
//!
//! At most one transfer is in `Submitting`/`AwaitingReceipt` at a time; a
//! second request is rejected, not queued. Failures are never retried: a
//! slow transaction resubmitted with a fresh nonce could pay twice.
//!
//! Each login starts a new session context with its own epoch and
//! cancellation token. Logout cancels the token, and any work still running
//! for an older epoch stops publishing into the controller.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{InputError, TransferError};
use super::types::{
    TransferFailure, TransferPhase, TransferRecord, TransferRequest, TransferResult, WalletEvent,
    WalletSnapshot,
};
use crate::balance_sync::BalanceSync;
use crate::blockchain::{
    build_relay_envelope, parse_address, transfer_call, ChainGateway, DecimalText, ProxyWallet,
    RelayEnvelope, TokenAmount, TokenBalance, TokenMetadata, PROXY_WALLET_FACTORY, USDC_E_TOKEN,
};
use crate::session::{Session, SessionBroker, SessionError};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Contracts the controller works against.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    /// Proxy wallet factory (derivation input and relay entry point)
    pub factory: Address,
    /// ERC-20 token being transferred
    pub token: Address,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            factory: PROXY_WALLET_FACTORY,
            token: USDC_E_TOKEN,
        }
    }
}

/// State owned by one logged-in session.
struct SessionContext {
    epoch: u64,
    session: Session,
    wallet: ProxyWallet,
    token: Option<TokenMetadata>,
    balance: Option<TokenBalance>,
    phase: TransferPhase,
    transfer: Option<TransferRecord>,
    last_error: Option<TransferFailure>,
    cancel: CancellationToken,
}

impl SessionContext {
    fn new(epoch: u64, session: Session, wallet: ProxyWallet) -> Self {
        Self {
            epoch,
            session,
            wallet,
            token: None,
            balance: None,
            phase: TransferPhase::Idle,
            transfer: None,
            last_error: None,
            cancel: CancellationToken::new(),
        }
    }

    fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            owner_address: self.wallet.owner_address,
            proxy_address: self.wallet.proxy_address,
            email: self.session.email.clone(),
            token: self.token.clone(),
            balance: self.balance.clone(),
            phase: self.phase,
            transfer: self.transfer.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Holds the in-flight slot; releases it on drop.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A validated and encoded transfer holding the in-flight slot.
///
/// Produced by [`TransferController::begin_transfer`] and consumed by
/// [`TransferController::execute`]. Dropping it releases the slot.
pub struct PreparedTransfer {
    epoch: u64,
    session: Session,
    holder: Address,
    record: TransferRecord,
    envelope: RelayEnvelope,
    cancel: CancellationToken,
    slot: InFlightGuard,
}

impl PreparedTransfer {
    pub fn record(&self) -> &TransferRecord {
        &self.record
    }

    pub fn envelope(&self) -> &RelayEnvelope {
        &self.envelope
    }
}

/// Orchestrates login, balance sync and the transfer pipeline.
pub struct TransferController {
    settings: ControllerSettings,
    gateway: Arc<dyn ChainGateway>,
    broker: Arc<dyn SessionBroker>,
    balances: BalanceSync,
    context: RwLock<Option<SessionContext>>,
    epoch: AtomicU64,
    in_flight: Arc<AtomicBool>,
    events: broadcast::Sender<WalletEvent>,
}

impl TransferController {
    pub fn new(
        settings: ControllerSettings,
        gateway: Arc<dyn ChainGateway>,
        broker: Arc<dyn SessionBroker>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            settings,
            balances: BalanceSync::new(gateway.clone()),
            gateway,
            broker,
            context: RwLock::new(None),
            epoch: AtomicU64::new(0),
            in_flight: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    /// Read model of the active session, if any.
    pub async fn snapshot(&self) -> Option<WalletSnapshot> {
        self.context.read().await.as_ref().map(SessionContext::snapshot)
    }

    /// Resume a session the broker already holds (e.g. after a restart).
    pub async fn restore(&self) -> Result<Option<WalletSnapshot>, TransferError> {
        match self.broker.current_session().await {
            Some(session) if session.authenticated => self.activate(session).await.map(Some),
            _ => Ok(None),
        }
    }

    /// Log in through the broker and start a session context.
    pub async fn login(&self, email: &str) -> Result<WalletSnapshot, TransferError> {
        let session = self.broker.login(email).await?;
        self.activate(session).await
    }

    /// End the session. A transfer still awaiting its receipt stays on-chain
    /// but its result is no longer published.
    pub async fn logout(&self) -> Result<(), TransferError> {
        let previous = self.context.write().await.take();
        if let Some(context) = &previous {
            context.cancel.cancel();
            if context.phase.is_in_flight() {
                warn!(
                    tx_hash = ?context.transfer.as_ref().and_then(|t| t.tx_hash),
                    "Logged out with a transfer in flight, its result will not be reported"
                );
            }
            info!(
                owner = %context.wallet.owner_address,
                phase = ?context.phase,
                "Session ended"
            );
            self.publish(WalletEvent::SessionEnded);
        }

        self.broker.logout().await?;
        Ok(())
    }

    /// Validate and encode a transfer, reserving the in-flight slot.
    pub async fn begin_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<PreparedTransfer, TransferError> {
        let (epoch, session, holder, balance, cancel) = {
            let context = self.context.read().await;
            let context = context.as_ref().ok_or(SessionError::NotAuthenticated)?;
            (
                context.epoch,
                context.session.clone(),
                context.wallet.proxy_address,
                context.balance.clone(),
                context.cancel.clone(),
            )
        };

        let slot = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            debug!("Transfer rejected: another transfer is in flight");
            TransferError::InFlight
        })?;

        self.set_phase(epoch, TransferPhase::Validating, None).await;
        let (destination, amount, token) =
            match self.validate(epoch, request, balance.as_ref()).await {
                Ok(valid) => valid,
                Err(e) => return Err(self.fail_early(epoch, e).await),
            };

        self.set_phase(epoch, TransferPhase::Encoding, None).await;
        let call = transfer_call(token.address, destination, amount);
        let envelope = match build_relay_envelope(self.settings.factory, vec![call]) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "Relay envelope invariant violated");
                return Err(self.fail_early(epoch, e.into()).await);
            }
        };

        let record = TransferRecord::new(destination, amount, &token);
        let stored = self
            .update(epoch, |context| {
                context.transfer = Some(record.clone());
                context.last_error = None;
            })
            .await;
        if !stored {
            return Err(SessionError::SessionEnded.into());
        }

        info!(
            transfer_id = %record.id,
            destination = %destination,
            amount = %record.amount_formatted,
            symbol = %record.symbol,
            "Transfer prepared"
        );

        Ok(PreparedTransfer {
            epoch,
            session,
            holder,
            record,
            envelope,
            cancel,
            slot,
        })
    }

    /// Submit a prepared transfer and wait for its terminal result.
    pub async fn execute(&self, prepared: PreparedTransfer) -> Result<TransferRecord, TransferError> {
        let PreparedTransfer {
            epoch,
            session,
            holder,
            mut record,
            envelope,
            cancel,
            slot,
        } = prepared;

        self.set_phase(epoch, TransferPhase::Submitting, Some(record.id))
            .await;

        let signer = match self.broker.signer(&session).await {
            Ok(signer) => signer,
            Err(e) => return self.finish(epoch, record, Err(e.into())).await,
        };

        let submitted = tokio::select! {
            _ = cancel.cancelled() => return Err(abandon(&record)),
            result = self.gateway.submit(&envelope, signer.as_ref()) => result,
        };
        let pending = match submitted {
            Ok(pending) => pending,
            Err(e) => {
                warn!(transfer_id = %record.id, error = %e, "Relay submission failed");
                return self.finish(epoch, record, Err(e.into())).await;
            }
        };

        record.broadcast(pending.tx_hash, self.gateway.network().tx_url(pending.tx_hash));
        let tracked = self
            .update(epoch, |context| {
                context.phase = TransferPhase::AwaitingReceipt;
                context.transfer = Some(record.clone());
            })
            .await;
        if tracked {
            self.publish(WalletEvent::PhaseChanged {
                phase: TransferPhase::AwaitingReceipt,
                transfer_id: Some(record.id),
            });
        }
        info!(transfer_id = %record.id, tx_hash = %pending.tx_hash, "Awaiting receipt");

        let receipt = tokio::select! {
            _ = cancel.cancelled() => return Err(abandon(&record)),
            result = self.gateway.await_receipt(&pending) => result,
        };
        let outcome = match receipt {
            Ok(receipt) if receipt.success => Ok(receipt.tx_hash),
            Ok(receipt) => Err(TransferError::ChainRejection {
                tx_hash: Some(receipt.tx_hash),
                reason: format!("Transaction reverted in block {}", receipt.block_number),
            }),
            Err(e) => Err(TransferError::from_gateway(e, Some(pending.tx_hash))),
        };

        let confirmed = outcome.is_ok();
        let result = self.finish(epoch, record, outcome).await;
        drop(slot);

        if confirmed {
            self.sync_balance(epoch, holder).await;
        }
        result
    }

    /// Run the whole pipeline for one request.
    pub async fn submit_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferRecord, TransferError> {
        let prepared = self.begin_transfer(request).await?;
        self.execute(prepared).await
    }

    async fn activate(&self, session: Session) -> Result<WalletSnapshot, TransferError> {
        if !session.authenticated {
            return Err(SessionError::NotAuthenticated.into());
        }

        let wallet = ProxyWallet::for_owner(self.settings.factory, session.owner_address);
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut context = self.context.write().await;
            if let Some(previous) = context.take() {
                previous.cancel.cancel();
            }
            *context = Some(SessionContext::new(epoch, session, wallet));
        }

        info!(
            owner = %wallet.owner_address,
            proxy = %wallet.proxy_address,
            "Session started"
        );
        self.publish(WalletEvent::SessionStarted { wallet });

        self.sync_balance(epoch, wallet.proxy_address).await;

        self.snapshot()
            .await
            .ok_or_else(|| SessionError::SessionEnded.into())
    }

    async fn validate(
        &self,
        epoch: u64,
        request: &TransferRequest,
        balance: Option<&TokenBalance>,
    ) -> Result<(Address, TokenAmount, TokenMetadata), TransferError> {
        let destination = request.destination.trim();
        if destination.is_empty() {
            return Err(InputError::MissingDestination.into());
        }
        let destination = parse_address(destination).map_err(InputError::from)?;
        if destination.is_zero() {
            return Err(InputError::ZeroDestination.into());
        }

        // Syntax first: malformed amounts never reach the chain.
        let text = DecimalText::parse(&request.amount).map_err(InputError::from)?;
        if text.is_zero() {
            return Err(InputError::ZeroAmount.into());
        }

        let token = self.token_metadata(epoch).await?;
        let amount =
            TokenAmount::from_decimal_str(&request.amount, token.decimals).map_err(InputError::from)?;

        // Soft check against the cached balance; the chain has the final say.
        if let Some(balance) = balance {
            if amount > balance.balance_raw {
                return Err(InputError::InsufficientBalance {
                    available: format!("{} {}", balance.balance_formatted, balance.symbol),
                }
                .into());
            }
        }

        Ok((destination, amount, token))
    }

    /// Token metadata for the session, read from the contract on first use.
    async fn token_metadata(&self, epoch: u64) -> Result<TokenMetadata, TransferError> {
        let cached = self
            .context
            .read()
            .await
            .as_ref()
            .filter(|context| context.epoch == epoch)
            .and_then(|context| context.token.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        let token = self.balances.token_metadata(self.settings.token).await?;
        self.update(epoch, |context| context.token = Some(token.clone()))
            .await;
        Ok(token)
    }

    async fn sync_balance(&self, epoch: u64, holder: Address) {
        let token = match self.token_metadata(epoch).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Token metadata unavailable, balance not refreshed");
                return;
            }
        };

        match self.balances.refresh(holder, &token).await {
            Ok(balance) => {
                let applied = self
                    .update(epoch, |context| context.balance = Some(balance.clone()))
                    .await;
                if applied {
                    self.publish(WalletEvent::BalanceUpdated { balance });
                }
            }
            Err(e) => warn!(holder = %holder, error = %e, "Balance refresh failed"),
        }
    }

    /// Settle the record and publish it if the session is still current.
    async fn finish(
        &self,
        epoch: u64,
        mut record: TransferRecord,
        outcome: Result<TxHash, TransferError>,
    ) -> Result<TransferRecord, TransferError> {
        let (phase, result) = match &outcome {
            Ok(tx_hash) => (
                TransferPhase::Confirmed,
                TransferResult::Confirmed { tx_hash: *tx_hash },
            ),
            Err(e) => (
                TransferPhase::Failed,
                TransferResult::Failed { reason: e.into() },
            ),
        };
        record.settle(result);

        let failure = outcome.as_ref().err().map(TransferFailure::from);
        let published = self
            .update(epoch, |context| {
                context.phase = phase;
                context.transfer = Some(record.clone());
                context.last_error = failure;
            })
            .await;

        match &outcome {
            Ok(tx_hash) => info!(transfer_id = %record.id, tx_hash = %tx_hash, "Transfer confirmed"),
            Err(e) => warn!(
                transfer_id = %record.id,
                error_code = e.error_code(),
                error = %e,
                "Transfer failed"
            ),
        }

        if published {
            self.publish(WalletEvent::PhaseChanged {
                phase,
                transfer_id: Some(record.id),
            });
            self.publish(WalletEvent::TransferSettled {
                transfer: record.clone(),
            });
        } else {
            info!(transfer_id = %record.id, "Session ended before the transfer settled, result dropped");
        }

        outcome.map(|_| record)
    }

    /// Fail before anything was submitted. The slot is released by the caller
    /// dropping its guard.
    async fn fail_early(&self, epoch: u64, error: TransferError) -> TransferError {
        debug!(error_code = error.error_code(), error = %error, "Transfer rejected");
        let failure = TransferFailure::from(&error);
        let applied = self
            .update(epoch, |context| {
                context.phase = TransferPhase::Failed;
                context.last_error = Some(failure);
            })
            .await;
        if applied {
            self.publish(WalletEvent::PhaseChanged {
                phase: TransferPhase::Failed,
                transfer_id: None,
            });
        }
        error
    }

    async fn set_phase(&self, epoch: u64, phase: TransferPhase, transfer_id: Option<uuid::Uuid>) {
        if self.update(epoch, |context| context.phase = phase).await {
            self.publish(WalletEvent::PhaseChanged { phase, transfer_id });
        }
    }

    /// Apply `f` to the session context if `epoch` is still the active one.
    async fn update<F>(&self, epoch: u64, f: F) -> bool
    where
        F: FnOnce(&mut SessionContext) + Send,
    {
        let mut context = self.context.write().await;
        match context.as_mut() {
            Some(context) if context.epoch == epoch => {
                f(context);
                true
            }
            _ => false,
        }
    }

    fn publish(&self, event: WalletEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn abandon(record: &TransferRecord) -> TransferError {
    info!(
        transfer_id = %record.id,
        tx_hash = ?record.tx_hash,
        "Session ended while the transfer was in flight, no longer tracking it"
    );
    SessionError::SessionEnded.into()
}
