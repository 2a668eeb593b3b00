// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract interactions.
//!
//! Reads are expressed as raw calldata plus a decoder so they can travel
//! through any [`ChainGateway`](super::gateway::ChainGateway).

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

use super::encoding::EncodingError;

// The subset of ERC-20 this service reads and relays.
sol! {
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Calldata for `balanceOf(holder)`.
pub fn balance_of_calldata(holder: Address) -> Bytes {
    IERC20::balanceOfCall { account: holder }.abi_encode().into()
}

/// Calldata for `decimals()`.
pub fn decimals_calldata() -> Bytes {
    IERC20::decimalsCall {}.abi_encode().into()
}

/// Calldata for `symbol()`.
pub fn symbol_calldata() -> Bytes {
    IERC20::symbolCall {}.abi_encode().into()
}

/// Decode the return data of `balanceOf`.
pub fn decode_balance(data: &[u8]) -> Result<U256, EncodingError> {
    IERC20::balanceOfCall::abi_decode_returns(data)
        .map_err(|e| EncodingError::Decode(format!("balanceOf: {e}")))
}

/// Decode the return data of `decimals`.
pub fn decode_decimals(data: &[u8]) -> Result<u8, EncodingError> {
    IERC20::decimalsCall::abi_decode_returns(data)
        .map_err(|e| EncodingError::Decode(format!("decimals: {e}")))
}

/// Decode the return data of `symbol`.
pub fn decode_symbol(data: &[u8]) -> Result<String, EncodingError> {
    IERC20::symbolCall::abi_decode_returns(data)
        .map_err(|e| EncodingError::Decode(format!("symbol: {e}")))
}
