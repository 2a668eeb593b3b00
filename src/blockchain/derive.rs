// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Proxy wallet address derivation.
//!
//! The factory deploys each user's proxy wallet with CREATE2, salted by the
//! owner address. The address is therefore known before deployment and is
//! computed locally, never fetched:
//!
//! ```text
//! salt  = keccak256(owner)                       // 20 packed bytes
//! proxy = keccak256(0xff ++ factory ++ salt ++ PROXY_INIT_CODE_HASH)[12..]
//! ```
//!
//! This must match the factory bit-for-bit. A divergent result is a wallet
//! address that nobody controls.

use alloy::primitives::{b256, keccak256, Address, B256};
use serde::Serialize;
use utoipa::ToSchema;

use super::address::{parse_address, AddressError};

/// keccak256 of the proxy wallet creation code used by the factory.
pub const PROXY_INIT_CODE_HASH: B256 =
    b256!("d21df8dc65880a8606f09fe0ce3df9b8869287ab0b058be05aa9e8af6330a00b");

/// Derive the proxy wallet address for `owner` under `factory`.
pub fn derive_proxy_wallet(factory: Address, owner: Address) -> Address {
    let salt = keccak256(owner.as_slice());
    factory.create2(salt, PROXY_INIT_CODE_HASH)
}

/// Derive from textual addresses, failing on malformed input.
pub fn derive_proxy_wallet_address(factory: &str, owner: &str) -> Result<Address, AddressError> {
    let factory = parse_address(factory)?;
    let owner = parse_address(owner)?;
    Ok(derive_proxy_wallet(factory, owner))
}

/// An owner account paired with its derived proxy wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProxyWallet {
    /// Externally owned account that controls the proxy
    #[schema(value_type = String)]
    pub owner_address: Address,
    /// Derived proxy wallet address holding the funds
    #[schema(value_type = String)]
    pub proxy_address: Address,
}

impl ProxyWallet {
    pub fn for_owner(factory: Address, owner: Address) -> Self {
        Self {
            owner_address: owner,
            proxy_address: derive_proxy_wallet(factory, owner),
        }
    }
}
