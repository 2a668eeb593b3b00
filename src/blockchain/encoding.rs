// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract call encoding.
//!
//! Every call relayed through a proxy wallet is a [`CallDescriptor`]: the
//! target contract, the canonical signature, and the ABI payload (4-byte
//! selector followed by 32-byte big-endian words). Token transfers use the
//! statically typed ERC-20 binding; anything else goes through
//! [`encode_call`], which parses the signature at runtime.

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::Function,
    primitives::{Address, Bytes, Selector, U256},
    sol_types::SolCall,
};
use serde::Serialize;

use super::amount::TokenAmount;
use super::erc20::IERC20;

/// Canonical signature of the ERC-20 transfer function.
pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// How the proxy wallet executes a relayed call (`typeCode` on-chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Call = 1,
    DelegateCall = 2,
}

impl CallType {
    pub fn type_code(self) -> u8 {
        self as u8
    }
}

/// One call to be executed by the proxy wallet. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    target: Address,
    signature: String,
    payload: Bytes,
    native_value: U256,
    call_type: CallType,
}

impl CallDescriptor {
    /// A plain call carrying no native value.
    pub fn new(target: Address, signature: impl Into<String>, payload: Bytes) -> Self {
        Self {
            target,
            signature: signature.into(),
            payload,
            native_value: U256::ZERO,
            call_type: CallType::Call,
        }
    }

    /// Attach native currency (in wei) forwarded with the call.
    pub fn with_native_value(mut self, value: U256) -> Self {
        self.native_value = value;
        self
    }

    pub fn with_call_type(mut self, call_type: CallType) -> Self {
        self.call_type = call_type;
        self
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn native_value(&self) -> U256 {
        self.native_value
    }

    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    /// First four payload bytes, if present.
    pub fn payload_selector(&self) -> Option<Selector> {
        self.payload
            .get(..4)
            .map(|bytes| Selector::from_slice(bytes))
    }
}

/// Encode `transfer(recipient, amount)` for an ERC-20 contract.
pub fn encode_transfer(recipient: Address, amount: TokenAmount) -> Bytes {
    IERC20::transferCall {
        to: recipient,
        amount: amount.base_units(),
    }
    .abi_encode()
    .into()
}

/// Build the descriptor for a token transfer executed by the proxy wallet.
pub fn transfer_call(token: Address, recipient: Address, amount: TokenAmount) -> CallDescriptor {
    CallDescriptor::new(token, TRANSFER_SIGNATURE, encode_transfer(recipient, amount))
}

/// Selector of a canonical signature such as `transfer(address,uint256)`.
pub fn selector(signature: &str) -> Result<Selector, EncodingError> {
    Ok(parse_signature(signature)?.selector())
}

/// Encode a call from its canonical signature and dynamic argument values.
pub fn encode_call(signature: &str, args: &[DynSolValue]) -> Result<Bytes, EncodingError> {
    let function = parse_signature(signature)?;
    if function.inputs.len() != args.len() {
        return Err(EncodingError::ArgumentCount {
            signature: signature.to_string(),
            expected: function.inputs.len(),
            actual: args.len(),
        });
    }

    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| EncodingError::Arguments {
            signature: signature.to_string(),
            reason: e.to_string(),
        })
}

fn parse_signature(signature: &str) -> Result<Function, EncodingError> {
    Function::parse(signature).map_err(|e| EncodingError::Signature {
        signature: signature.to_string(),
        reason: e.to_string(),
    })
}

/// Encoding and envelope invariant violations.
///
/// These indicate a bug in the caller, not bad user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("Invalid function signature `{signature}`: {reason}")]
    Signature { signature: String, reason: String },

    #[error("`{signature}` takes {expected} arguments, got {actual}")]
    ArgumentCount {
        signature: String,
        expected: usize,
        actual: usize,
    },

    #[error("Arguments do not match `{signature}`: {reason}")]
    Arguments { signature: String, reason: String },

    #[error("Relay envelope must contain at least one call")]
    EmptyEnvelope,

    #[error("Call {index} targets the zero address")]
    ZeroTarget { index: usize },

    #[error("Call {index} payload is shorter than a function selector")]
    MissingSelector { index: usize },

    #[error("Call {index} payload selector does not match `{signature}`")]
    SelectorMismatch { index: usize, signature: String },

    #[error("Total native value overflows")]
    ValueOverflow,

    #[error("Failed to decode return data: {0}")]
    Decode(String),
}
