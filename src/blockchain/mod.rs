// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for Polygon PoS.
//!
//! This module provides functionality for:
//! - Parsing addresses and exact token amounts
//! - Deriving a proxy wallet address from its owner (CREATE2)
//! - Encoding ERC-20 and generic contract calls
//! - Wrapping calls into a relay envelope for the proxy wallet factory
//! - Talking to the chain through the [`ChainGateway`] boundary

pub mod address;
pub mod amount;
pub mod derive;
pub mod encoding;
pub mod erc20;
pub mod gateway;
pub mod relay;
pub mod types;

pub use address::{parse_address, AddressError};
pub use amount::{AmountError, DecimalText, TokenAmount};
pub use derive::{derive_proxy_wallet, derive_proxy_wallet_address, ProxyWallet};
pub use encoding::{encode_call, encode_transfer, transfer_call, CallDescriptor, CallType, EncodingError};
pub use gateway::{ChainGateway, GatewayError, PendingTx, ReceiptPolling, RpcGateway};
pub use relay::{build_relay_envelope, RelayEnvelope};
pub use types::*;
