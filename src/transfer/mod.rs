// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transfer Module
//!
//! Turns user intent (destination, amount) into a relayed token transfer:
//!
//! 1. Validate the request against the session and the cached balance
//! 2. Encode `transfer(address,uint256)` and wrap it in a relay envelope
//! 3. Submit through the chain gateway with the session's signer
//! 4. Wait for the receipt and publish the result
//!
//! The [`TransferController`] owns all per-session state and publishes
//! [`WalletEvent`]s to any number of subscribers.

mod controller;
mod error;
mod types;

pub use controller::{ControllerSettings, PreparedTransfer, TransferController};
pub use error::{InputError, TransferError};
pub use types::{
    TransferFailure, TransferPhase, TransferRecord, TransferRequest, TransferResult, WalletEvent,
    WalletSnapshot,
};
