// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer error taxonomy.

use alloy::primitives::TxHash;

use crate::balance_sync::BalanceError;
use crate::blockchain::{AddressError, AmountError, EncodingError, GatewayError};
use crate::session::SessionError;

/// Bad user input, rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Destination address is required")]
    MissingDestination,

    #[error("Invalid destination address: {0}")]
    Destination(#[from] AddressError),

    #[error("Destination must not be the zero address")]
    ZeroDestination,

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Amount exceeds available balance of {available}")]
    InsufficientBalance { available: String },
}

/// Every way a transfer can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("A transfer is already in flight")]
    InFlight,

    /// Internal invariant violation; never caused by user input.
    #[error("Encoding invariant violated: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Network error: {0}")]
    Network(String),

    /// The token contract answered, but not like an ERC-20 this service can
    /// handle. Retrying will not help.
    #[error("Unsupported token contract: {0}")]
    UnsupportedToken(String),

    #[error("Transaction rejected on-chain: {reason}")]
    ChainRejection {
        tx_hash: Option<TxHash>,
        reason: String,
    },
}

impl TransferError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransferError::Input(InputError::MissingDestination)
            | TransferError::Input(InputError::Destination(_))
            | TransferError::Input(InputError::ZeroDestination) => "invalid_destination",
            TransferError::Input(InputError::InsufficientBalance { .. }) => "insufficient_balance",
            TransferError::Input(_) => "invalid_amount",
            TransferError::Session(e) => e.error_code(),
            TransferError::InFlight => "transfer_in_flight",
            TransferError::Encoding(_) => "encoding_error",
            TransferError::Network(_) => "network_error",
            TransferError::UnsupportedToken(_) => "unsupported_token",
            TransferError::ChainRejection { .. } => "chain_rejection",
        }
    }

    /// Classify a gateway failure for a transaction that may already be broadcast.
    pub fn from_gateway(error: GatewayError, tx_hash: Option<TxHash>) -> Self {
        match error {
            GatewayError::Reverted(reason) => TransferError::ChainRejection { tx_hash, reason },
            GatewayError::Signing(e) => TransferError::Session(e),
            GatewayError::InvalidRpcUrl(_) | GatewayError::Rpc(_) | GatewayError::ReceiptTimeout(_) => {
                TransferError::Network(error.to_string())
            }
        }
    }
}

impl From<GatewayError> for TransferError {
    fn from(error: GatewayError) -> Self {
        TransferError::from_gateway(error, None)
    }
}

impl From<BalanceError> for TransferError {
    fn from(error: BalanceError) -> Self {
        match error {
            BalanceError::Gateway(e) => e.into(),
            BalanceError::Decode(_) | BalanceError::UnsupportedDecimals(_) => {
                TransferError::UnsupportedToken(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn error_codes() {
        assert_eq!(
            TransferError::from(InputError::ZeroDestination).error_code(),
            "invalid_destination"
        );
        assert_eq!(
            TransferError::from(InputError::Amount(AmountError::Negative)).error_code(),
            "invalid_amount"
        );
        assert_eq!(
            TransferError::from(SessionError::NotAuthenticated).error_code(),
            "not_authenticated"
        );
        assert_eq!(TransferError::InFlight.error_code(), "transfer_in_flight");
    }

    #[test]
    fn gateway_failures_are_classified() {
        let hash = TxHash::repeat_byte(7);
        assert_eq!(
            TransferError::from_gateway(GatewayError::Reverted("out of gas".into()), Some(hash)),
            TransferError::ChainRejection {
                tx_hash: Some(hash),
                reason: "out of gas".into()
            }
        );
        assert!(matches!(
            TransferError::from(GatewayError::ReceiptTimeout(Duration::from_secs(120))),
            TransferError::Network(_)
        ));
        assert_eq!(
            TransferError::from(GatewayError::Signing(SessionError::OwnerMismatch)),
            TransferError::Session(SessionError::OwnerMismatch)
        );
    }

    #[test]
    fn token_contract_faults_are_not_network_errors() {
        let err = TransferError::from(BalanceError::UnsupportedDecimals(90));
        assert!(matches!(err, TransferError::UnsupportedToken(_)));
        assert_eq!(err.error_code(), "unsupported_token");

        let err = TransferError::from(BalanceError::Decode(EncodingError::Decode(
            "decimals: buffer overrun".into(),
        )));
        assert_eq!(err.error_code(), "unsupported_token");

        assert!(matches!(
            TransferError::from(BalanceError::Gateway(GatewayError::Rpc("refused".into()))),
            TransferError::Network(_)
        ));
    }
}
