// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::amount::TokenAmount;

/// Polygon network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Block explorer URL
    pub explorer_url: String,
}

/// Public Polygon RPC endpoint used when no override is configured.
pub const POLYGON_RPC_URL: &str = "https://polygon-rpc.com/";

/// Polygon PoS chain ID.
pub const POLYGON_CHAIN_ID: u64 = 137;

impl NetworkConfig {
    /// Polygon PoS mainnet, optionally with a custom RPC endpoint.
    pub fn polygon(rpc_url: Option<&str>) -> Self {
        Self {
            name: "Polygon PoS".to_string(),
            chain_id: POLYGON_CHAIN_ID,
            rpc_url: rpc_url.unwrap_or(POLYGON_RPC_URL).to_string(),
            explorer_url: "https://polygonscan.com".to_string(),
        }
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: impl std::fmt::Display) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

/// Proxy wallet factory on Polygon. Also the relay entry point: calls sent to
/// `proxy(...)` execute through the caller's proxy wallet.
pub const PROXY_WALLET_FACTORY: Address = address!("aB45c5A4B0c941a2F231C04C3f49182e1A254052");

/// Bridged USDC (USDC.e) on Polygon.
pub const USDC_E_TOKEN: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

/// Token contract metadata read from the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenMetadata {
    /// Contract address
    #[schema(value_type = String)]
    pub address: Address,
    /// Token symbol (e.g., "USDC")
    pub symbol: String,
    /// Number of decimals reported by `decimals()`
    pub decimals: u8,
}

/// Token balance of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenBalance {
    /// Wallet the balance belongs to
    #[schema(value_type = String)]
    pub holder: Address,
    /// Token symbol
    pub symbol: String,
    /// Balance in the token's smallest unit
    #[schema(value_type = String)]
    pub balance_raw: TokenAmount,
    /// Balance formatted with decimals
    pub balance_formatted: String,
    /// Number of decimals
    pub decimals: u8,
    /// Token contract address
    #[schema(value_type = String)]
    pub contract_address: Address,
}

impl TokenBalance {
    /// Build a balance record for `holder`, formatting with the token's decimals.
    pub fn new(holder: Address, token: &TokenMetadata, amount: TokenAmount) -> Self {
        Self {
            holder,
            symbol: token.symbol.clone(),
            balance_formatted: amount.to_decimal_string(token.decimals),
            balance_raw: amount,
            decimals: token.decimals,
            contract_address: token.address,
        }
    }
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: alloy::primitives::TxHash,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}
