//! Shared protocol types.

use alloy_primitives::{address, Address, U256};

/// Sentinel asset id for the chain's native, unwrapped value.
///
/// The native token has no contract of its own, so the protocol addresses it
/// through this reserved pseudo-address.
pub const PROTOCOL_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// An amount of a specific underlying asset.
///
/// Multi-asset inputs and outputs are ordered lists of these; the order must
/// match the order reported by `get_underlying` for the dependent in question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnderlyingAmount {
    pub underlying: Address,
    pub amount: U256,
}

impl UnderlyingAmount {
    pub fn new(underlying: Address, amount: U256) -> Self {
        Self { underlying, amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_token_is_the_reserved_pseudo_address() {
        assert_eq!(
            PROTOCOL_TOKEN.to_checksum(None),
            "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"
        );
    }
}
