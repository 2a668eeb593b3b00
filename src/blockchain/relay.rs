// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relay envelopes for the proxy wallet factory.
//!
//! The factory exposes a single entry point, `proxy(ProxyCall[])`. It looks up
//! (or deploys) the caller's proxy wallet and executes every call in order
//! inside one transaction: either all succeed or the whole batch reverts.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

use super::encoding::{selector, CallDescriptor, EncodingError};

sol! {
    interface IProxyWalletFactory {
        struct ProxyCall {
            uint8 typeCode;
            address to;
            uint256 value;
            bytes data;
        }

        function proxy(ProxyCall[] calls) external payable returns (bytes[] returnValues);
    }
}

/// An ordered, non-empty batch of calls for one relay transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEnvelope {
    factory: Address,
    calls: Vec<CallDescriptor>,
    native_value: U256,
}

impl RelayEnvelope {
    /// Contract the outer transaction is sent to.
    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Calls in execution order.
    pub fn calls(&self) -> &[CallDescriptor] {
        &self.calls
    }

    /// Native value attached to the outer transaction (sum over calls).
    pub fn native_value(&self) -> U256 {
        self.native_value
    }

    /// Calldata of the outer `proxy(...)` call.
    pub fn calldata(&self) -> Bytes {
        let calls = self
            .calls
            .iter()
            .map(|call| IProxyWalletFactory::ProxyCall {
                typeCode: call.call_type().type_code(),
                to: call.target(),
                value: call.native_value(),
                data: call.payload().clone(),
            })
            .collect();

        IProxyWalletFactory::proxyCall { calls }.abi_encode().into()
    }
}

/// Validate `calls` and wrap them for submission through `factory`.
///
/// Side-effect free. Fails if the list is empty, a call targets the zero
/// address, or a payload does not start with its signature's selector.
pub fn build_relay_envelope(
    factory: Address,
    calls: Vec<CallDescriptor>,
) -> Result<RelayEnvelope, EncodingError> {
    if calls.is_empty() {
        return Err(EncodingError::EmptyEnvelope);
    }

    let mut native_value = U256::ZERO;
    for (index, call) in calls.iter().enumerate() {
        if call.target().is_zero() {
            return Err(EncodingError::ZeroTarget { index });
        }

        let actual = call
            .payload_selector()
            .ok_or(EncodingError::MissingSelector { index })?;
        if actual != selector(call.signature())? {
            return Err(EncodingError::SelectorMismatch {
                index,
                signature: call.signature().to_string(),
            });
        }

        native_value = native_value
            .checked_add(call.native_value())
            .ok_or(EncodingError::ValueOverflow)?;
    }

    Ok(RelayEnvelope {
        factory,
        calls,
        native_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::amount::TokenAmount;
    use crate::blockchain::encoding::{encode_call, transfer_call, CallType};
    use crate::blockchain::types::{PROXY_WALLET_FACTORY, USDC_E_TOKEN};
    use alloy::primitives::{address, bytes};

    const RECIPIENT: Address = address!("ccccccccccccccccccccccccccccccccccccccc3");

    fn usdc_transfer(units: u64) -> CallDescriptor {
        transfer_call(USDC_E_TOKEN, RECIPIENT, TokenAmount::from(units))
    }

    #[test]
    fn proxy_selector_is_canonical() {
        assert_eq!(
            IProxyWalletFactory::proxyCall::SELECTOR,
            [0x34, 0xee, 0x97, 0x91]
        );
        assert_eq!(
            IProxyWalletFactory::proxyCall::SIGNATURE,
            "proxy((uint8,address,uint256,bytes)[])"
        );
    }

    #[test]
    fn empty_envelope_is_rejected() {
        assert_eq!(
            build_relay_envelope(PROXY_WALLET_FACTORY, vec![]),
            Err(EncodingError::EmptyEnvelope)
        );
    }

    #[test]
    fn preserves_call_order() {
        let calls = vec![usdc_transfer(1), usdc_transfer(2), usdc_transfer(3)];
        let envelope = build_relay_envelope(PROXY_WALLET_FACTORY, calls.clone()).unwrap();
        assert_eq!(envelope.calls(), calls.as_slice());
        assert_eq!(envelope.factory(), PROXY_WALLET_FACTORY);
    }

    #[test]
    fn rejects_zero_target() {
        let call = transfer_call(Address::ZERO, RECIPIENT, TokenAmount::from(1u64));
        assert_eq!(
            build_relay_envelope(PROXY_WALLET_FACTORY, vec![usdc_transfer(1), call]),
            Err(EncodingError::ZeroTarget { index: 1 })
        );
    }

    #[test]
    fn rejects_inconsistent_payloads() {
        let short = CallDescriptor::new(USDC_E_TOKEN, "transfer(address,uint256)", bytes!("a905"));
        assert_eq!(
            build_relay_envelope(PROXY_WALLET_FACTORY, vec![short]),
            Err(EncodingError::MissingSelector { index: 0 })
        );

        let mislabeled = CallDescriptor::new(
            USDC_E_TOKEN,
            "approve(address,uint256)",
            usdc_transfer(1).payload().clone(),
        );
        assert!(matches!(
            build_relay_envelope(PROXY_WALLET_FACTORY, vec![mislabeled]),
            Err(EncodingError::SelectorMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn sums_native_value() {
        let payload = encode_call("deposit()", &[]).unwrap();
        let deposit = CallDescriptor::new(USDC_E_TOKEN, "deposit()", payload)
            .with_native_value(U256::from(7u64));
        let envelope = build_relay_envelope(
            PROXY_WALLET_FACTORY,
            vec![deposit.clone(), usdc_transfer(1), deposit],
        )
        .unwrap();
        assert_eq!(envelope.native_value(), U256::from(14u64));

        let overflowing =
            CallDescriptor::new(USDC_E_TOKEN, "deposit()", encode_call("deposit()", &[]).unwrap())
                .with_native_value(U256::MAX);
        assert_eq!(
            build_relay_envelope(
                PROXY_WALLET_FACTORY,
                vec![overflowing.clone(), overflowing]
            ),
            Err(EncodingError::ValueOverflow)
        );
    }

    #[test]
    fn envelope_calldata_known_answer() {
        let envelope =
            build_relay_envelope(PROXY_WALLET_FACTORY, vec![usdc_transfer(1_000_000)]).unwrap();
        let expected = bytes!(
            "34ee9791"
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000002791bca1f2de4661ed88a30c99a7a9449aa84174"
            "0000000000000000000000000000000000000000000000000000000000000000"
            "0000000000000000000000000000000000000000000000000000000000000080"
            "0000000000000000000000000000000000000000000000000000000000000044"
            "a9059cbb000000000000000000000000cccccccccccccccccccccccccccccccc"
            "ccccccc300000000000000000000000000000000000000000000000000000000"
            "000f424000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(envelope.calldata(), expected);
    }

    #[test]
    fn calldata_round_trips_through_factory_binding() {
        let delegate = usdc_transfer(9).with_call_type(CallType::DelegateCall);
        let envelope =
            build_relay_envelope(PROXY_WALLET_FACTORY, vec![usdc_transfer(5), delegate]).unwrap();

        let decoded = IProxyWalletFactory::proxyCall::abi_decode(&envelope.calldata()).unwrap();
        assert_eq!(decoded.calls.len(), 2);
        assert_eq!(decoded.calls[0].typeCode, 1);
        assert_eq!(decoded.calls[1].typeCode, 2);
        assert_eq!(decoded.calls[0].to, USDC_E_TOKEN);
        assert_eq!(decoded.calls[1].data, *envelope.calls()[1].payload());
    }
}
