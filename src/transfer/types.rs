// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer request, result and read-model types.

use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::TransferError;
use crate::blockchain::{ProxyWallet, TokenAmount, TokenBalance, TokenMetadata};

/// User intent as typed into the transfer form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Recipient address (0x-prefixed hex)
    pub destination: String,
    /// Human-readable amount, e.g. "1.5"
    pub amount: String,
}

impl TransferRequest {
    pub fn new(destination: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            amount: amount.into(),
        }
    }
}

/// Controller state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    Idle,
    Validating,
    Encoding,
    Submitting,
    AwaitingReceipt,
    Confirmed,
    Failed,
}

impl TransferPhase {
    /// Phases during which the relay transaction may be on its way to the chain.
    pub fn is_in_flight(self) -> bool {
        matches!(self, TransferPhase::Submitting | TransferPhase::AwaitingReceipt)
    }
}

/// Displayable failure attached to a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransferFailure {
    /// Machine-readable error code
    pub error_code: String,
    /// Human-readable reason
    pub message: String,
}

impl From<&TransferError> for TransferFailure {
    fn from(error: &TransferError) -> Self {
        Self {
            error_code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a submitted transfer. Leaves `Pending` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferResult {
    Pending,
    Confirmed {
        #[schema(value_type = String)]
        tx_hash: TxHash,
    },
    Failed {
        reason: TransferFailure,
    },
}

impl TransferResult {
    pub fn is_pending(&self) -> bool {
        matches!(self, TransferResult::Pending)
    }
}

/// A transfer as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransferRecord {
    #[schema(value_type = String)]
    pub id: Uuid,
    /// Recipient
    #[schema(value_type = String)]
    pub destination: Address,
    /// Amount in base units
    #[schema(value_type = String)]
    pub amount: TokenAmount,
    /// Amount formatted with the token's decimals
    pub amount_formatted: String,
    /// Token symbol
    pub symbol: String,
    pub result: TransferResult,
    /// Relay transaction hash, once broadcast
    #[schema(value_type = Option<String>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    /// Block explorer link, once broadcast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn new(destination: Address, amount: TokenAmount, token: &TokenMetadata) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            destination,
            amount,
            amount_formatted: amount.to_decimal_string(token.decimals),
            symbol: token.symbol.clone(),
            result: TransferResult::Pending,
            tx_hash: None,
            explorer_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn broadcast(&mut self, tx_hash: TxHash, explorer_url: String) {
        self.tx_hash = Some(tx_hash);
        self.explorer_url = Some(explorer_url);
        self.updated_at = Utc::now();
    }

    /// Move out of `Pending`. Returns `false` if the result was already final.
    pub(crate) fn settle(&mut self, result: TransferResult) -> bool {
        if !self.result.is_pending() || result.is_pending() {
            return false;
        }
        self.result = result;
        self.updated_at = Utc::now();
        true
    }
}

/// Everything the UI reads back for the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WalletSnapshot {
    #[schema(value_type = String)]
    pub owner_address: Address,
    #[schema(value_type = String)]
    pub proxy_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub token: Option<TokenMetadata>,
    pub balance: Option<TokenBalance>,
    pub phase: TransferPhase,
    pub transfer: Option<TransferRecord>,
    /// Most recent failure, including ones rejected before submission
    pub last_error: Option<TransferFailure>,
}

/// State changes published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WalletEvent {
    SessionStarted {
        wallet: ProxyWallet,
    },
    SessionEnded,
    BalanceUpdated {
        balance: TokenBalance,
    },
    PhaseChanged {
        phase: TransferPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        transfer_id: Option<Uuid>,
    },
    TransferSettled {
        transfer: TransferRecord,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::USDC_E_TOKEN;
    use alloy::primitives::B256;

    fn record() -> TransferRecord {
        let token = TokenMetadata {
            address: USDC_E_TOKEN,
            symbol: "USDC".to_string(),
            decimals: 6,
        };
        TransferRecord::new(Address::repeat_byte(0xcc), TokenAmount::from(1_500_000u64), &token)
    }

    #[test]
    fn new_record_is_pending_and_formatted() {
        let record = record();
        assert!(record.result.is_pending());
        assert_eq!(record.amount_formatted, "1.5");
        assert_eq!(record.symbol, "USDC");
        assert!(record.tx_hash.is_none());
    }

    #[test]
    fn result_settles_exactly_once() {
        let mut record = record();
        assert!(!record.settle(TransferResult::Pending));

        let tx_hash = B256::repeat_byte(1);
        assert!(record.settle(TransferResult::Confirmed { tx_hash }));
        assert!(!record.settle(TransferResult::Failed {
            reason: TransferFailure {
                error_code: "network_error".to_string(),
                message: "late".to_string(),
            },
        }));
        assert_eq!(record.result, TransferResult::Confirmed { tx_hash });
    }

    #[test]
    fn phase_classification() {
        assert!(TransferPhase::Submitting.is_in_flight());
        assert!(TransferPhase::AwaitingReceipt.is_in_flight());
        assert!(!TransferPhase::Encoding.is_in_flight());
        assert!(!TransferPhase::Failed.is_in_flight());
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let json = serde_json::to_value(TransferResult::Confirmed {
            tx_hash: B256::repeat_byte(0xab),
        })
        .unwrap();
        assert_eq!(json["status"], "confirmed");
        assert!(json["tx_hash"].as_str().unwrap().starts_with("0xabab"));
    }
}
