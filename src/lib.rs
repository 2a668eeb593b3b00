// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Proxy Wallet - Relayed ERC-20 transfers on Polygon
//!
//! Users hold funds in a proxy wallet: a contract account deployed by a
//! factory at a CREATE2 address derived from their owner account. Token
//! transfers are encoded locally, batched into a single `proxy(...)` call on
//! the factory and signed through the identity provider's session.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `balance_sync` - Token balance reads for the proxy wallet
//! - `blockchain` - Derivation, call encoding, relay envelopes, chain RPC
//! - `session` - Identity provider boundary and local development broker
//! - `transfer` - Transfer state machine

pub mod api;
pub mod balance_sync;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_support;
