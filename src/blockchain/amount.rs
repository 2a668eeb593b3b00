// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exact token amounts in base units.
//!
//! Amounts never pass through floating point. Parsing and formatting are
//! inverse operations for a fixed decimal count:
//! `from_decimal_str(a.to_decimal_string(d), d) == a` for every `a`.

use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest decimal count a 256-bit amount can represent (10^77 < 2^256).
pub const MAX_DECIMALS: u8 = 77;

/// A token amount in the token's smallest indivisible unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub const fn from_base_units(value: U256) -> Self {
        Self(value)
    }

    pub const fn base_units(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a human-readable decimal amount (e.g. "1.5") into base units.
    ///
    /// Accepts an optional whole part or an optional fractional part, but not
    /// both empty. Signs, exponents and separators are rejected.
    pub fn from_decimal_str(text: &str, decimals: u8) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(decimals));
        }

        let DecimalText { whole, fraction } = DecimalText::parse(text)?;
        if fraction.len() > decimals as usize {
            return Err(AmountError::TooManyDecimals { max: decimals });
        }

        let whole_units = if whole.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(whole, 10).map_err(|_| AmountError::Overflow)?
        };

        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        let fraction_units = if padded.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(&padded, 10).map_err(|_| AmountError::Overflow)?
        };

        let scale = U256::from(10u64).pow(U256::from(decimals));
        whole_units
            .checked_mul(scale)
            .and_then(|w| w.checked_add(fraction_units))
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Format base units as an exact decimal string, trailing zeros trimmed.
    pub fn to_decimal_string(&self, decimals: u8) -> String {
        if self.0.is_zero() {
            return "0".to_string();
        }
        if decimals == 0 {
            return self.0.to_string();
        }

        let divisor = U256::from(10u64).pow(U256::from(decimals));
        let whole = self.0 / divisor;
        let remainder = self.0 % divisor;

        if remainder.is_zero() {
            return whole.to_string();
        }

        let decimal_str = format!(
            "{:0>width$}",
            remainder.to_string(),
            width = decimals as usize
        );
        format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
    }
}

/// A syntactically valid decimal amount, not yet scaled to base units.
///
/// Everything checked here is independent of the token's decimal count, so
/// bad input can be rejected before the token is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalText<'a> {
    whole: &'a str,
    fraction: &'a str,
}

impl<'a> DecimalText<'a> {
    pub fn parse(text: &'a str) -> Result<Self, AmountError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AmountError::Empty);
        }
        if text.starts_with('-') {
            return Err(AmountError::Negative);
        }

        let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountError::InvalidFormat(text.to_string()));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AmountError::InvalidFormat(text.to_string()));
        }

        Ok(Self { whole, fraction })
    }

    /// True when every digit is zero ("0", "0.000", ".0").
    pub fn is_zero(&self) -> bool {
        self.whole.bytes().chain(self.fraction.bytes()).all(|b| b == b'0')
    }

    /// Number of digits after the decimal point.
    pub fn fraction_digits(&self) -> usize {
        self.fraction.len()
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Base units travel as decimal strings; JSON numbers cannot hold 256 bits.
impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(serde::de::Error::custom(format!(
                "invalid base unit amount: {raw}"
            )));
        }
        U256::from_str_radix(&raw, 10)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Errors raised while parsing a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount must not be negative")]
    Negative,

    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Too many decimal places (max {max})")]
    TooManyDecimals { max: u8 },

    #[error("Amount overflow")]
    Overflow,

    #[error("Unsupported decimal count: {0}")]
    UnsupportedDecimals(u8),
}
