// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token balance reads for the proxy wallet.
//!
//! Balances are fetched on two occasions only: once a session starts and
//! once a transfer is confirmed. The controller decides when; this module
//! only knows how.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{debug, warn};

use crate::blockchain::{
    amount::MAX_DECIMALS,
    erc20::{
        balance_of_calldata, decimals_calldata, decode_balance, decode_decimals, decode_symbol,
        symbol_calldata,
    },
    ChainGateway, EncodingError, GatewayError, TokenAmount, TokenBalance, TokenMetadata,
};

/// Shown when a token does not implement `symbol()` as a string.
const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Read-only balance queries through a [`ChainGateway`].
#[derive(Clone)]
pub struct BalanceSync {
    gateway: Arc<dyn ChainGateway>,
}

impl BalanceSync {
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        Self { gateway }
    }

    /// Read decimals and symbol from the token contract.
    ///
    /// Decimals are authoritative for every amount conversion, so failing to
    /// read them is an error. A missing symbol only affects display.
    pub async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, BalanceError> {
        let raw = self.gateway.call(token, decimals_calldata()).await?;
        let decimals = decode_decimals(&raw)?;
        if decimals > MAX_DECIMALS {
            return Err(BalanceError::UnsupportedDecimals(decimals));
        }

        let symbol = match self.gateway.call(token, symbol_calldata()).await {
            Ok(raw) => decode_symbol(&raw).unwrap_or_else(|e| {
                warn!(token = %token, error = %e, "Token symbol is not a string");
                UNKNOWN_SYMBOL.to_string()
            }),
            Err(e) => {
                warn!(token = %token, error = %e, "Failed to read token symbol");
                UNKNOWN_SYMBOL.to_string()
            }
        };

        debug!(token = %token, %symbol, decimals, "Token metadata loaded");
        Ok(TokenMetadata {
            address: token,
            symbol,
            decimals,
        })
    }

    /// Fetch the current balance of `holder` and format it for display.
    pub async fn refresh(
        &self,
        holder: Address,
        token: &TokenMetadata,
    ) -> Result<TokenBalance, BalanceError> {
        let raw = self
            .gateway
            .call(token.address, balance_of_calldata(holder))
            .await?;
        let amount = TokenAmount::from_base_units(decode_balance(&raw)?);

        let balance = TokenBalance::new(holder, token, amount);
        debug!(
            holder = %holder,
            balance = %balance.balance_formatted,
            symbol = %balance.symbol,
            "Balance refreshed"
        );
        Ok(balance)
    }
}

/// Errors raised while reading balances.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Unexpected token response: {0}")]
    Decode(#[from] EncodingError),

    #[error("Token reports {0} decimals, more than a 256-bit amount can hold")]
    UnsupportedDecimals(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::USDC_E_TOKEN;
    use crate::test_support::FakeGateway;
    use alloy::primitives::{address, U256};

    const PROXY: Address = address!("a2b24c140a85b94cb7837503f7a46efcffadc935");

    fn usdc() -> TokenMetadata {
        TokenMetadata {
            address: USDC_E_TOKEN,
            symbol: "USDC".to_string(),
            decimals: 6,
        }
    }

    #[tokio::test]
    async fn refresh_formats_with_token_decimals() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.set_balance(U256::from(2_500_000u64));
        let sync = BalanceSync::new(gateway.clone());

        let balance = sync.refresh(PROXY, &usdc()).await.unwrap();
        assert_eq!(balance.balance_formatted, "2.5");
        assert_eq!(balance.balance_raw, TokenAmount::from(2_500_000u64));
        assert_eq!(balance.holder, PROXY);
        assert_eq!(gateway.balance_reads(), 1);
    }

    #[tokio::test]
    async fn metadata_comes_from_the_contract() {
        let gateway = Arc::new(FakeGateway::new().with_token("USDC", 6));
        let sync = BalanceSync::new(gateway);

        let token = sync.token_metadata(USDC_E_TOKEN).await.unwrap();
        assert_eq!(token, usdc());
    }

    #[tokio::test]
    async fn rejects_unrepresentable_decimals() {
        let gateway = Arc::new(FakeGateway::new().with_token("WIDE", 78));
        let sync = BalanceSync::new(gateway);

        assert_eq!(
            sync.token_metadata(USDC_E_TOKEN).await,
            Err(BalanceError::UnsupportedDecimals(78))
        );
    }

    #[tokio::test]
    async fn network_failure_is_reported() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.set_reads_failing(true);
        let sync = BalanceSync::new(gateway);

        assert!(matches!(
            sync.refresh(PROXY, &usdc()).await,
            Err(BalanceError::Gateway(GatewayError::Rpc(_)))
        ));
    }
}
