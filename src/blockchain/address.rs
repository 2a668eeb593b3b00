// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Strict parsing of user-supplied addresses.

use alloy::primitives::Address;

/// Parse a `0x`-prefixed, 40 hex digit address.
///
/// All-lowercase and all-uppercase input is accepted as-is. Mixed case must
/// carry a valid EIP-55 checksum, so a single mistyped character in a
/// checksummed address is caught here instead of on-chain.
pub fn parse_address(raw: &str) -> Result<Address, AddressError> {
    let raw = raw.trim();
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;

    if hex.len() != 40 {
        return Err(AddressError::InvalidLength(hex.len()));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex);
    }

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        let normalized = format!("0x{hex}");
        Address::parse_checksummed(&normalized, None).map_err(|_| AddressError::BadChecksum)
    } else {
        hex.parse::<Address>().map_err(|_| AddressError::InvalidHex)
    }
}

/// Errors raised for malformed addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Address must start with 0x")]
    MissingPrefix,

    #[error("Address must be 40 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("Address contains non-hex characters")]
    InvalidHex,

    #[error("Address checksum mismatch")]
    BadChecksum,
}
