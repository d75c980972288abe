//! Recovery of stray balances.
//!
//! Funds can strand on a protocol component: donations, rebasing rounding,
//! tokens sent by mistake. The registry exposes these mechanics behind its
//! governor gate so stranded value is recoverable instead of frozen.

use alloy_primitives::{Address, U256};

use crate::error::TransformerError;
use crate::ledger::Ledger;
use crate::types::PROTOCOL_TOKEN;

/// A holder's balance of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    pub token: Address,
    pub balance: U256,
}

/// Balance of `holder` in each of `tokens`. The protocol token reads the
/// holder's native balance; unknown token ids error.
pub fn balances(
    ledger: &dyn Ledger,
    holder: Address,
    tokens: &[Address],
) -> Result<Vec<TokenBalance>, TransformerError> {
    tokens
        .iter()
        .map(|&token| {
            let balance = if token == PROTOCOL_TOKEN {
                ledger.native_balance(holder)
            } else {
                ledger.erc20(token)?.balance_of(holder)
            };
            Ok(TokenBalance { token, balance })
        })
        .collect()
}

/// Move stray funds held by `holder` to `recipient`.
pub fn send_dust(
    ledger: &dyn Ledger,
    holder: Address,
    token: Address,
    amount: U256,
    recipient: Address,
) -> Result<(), TransformerError> {
    if recipient == Address::ZERO {
        return Err(TransformerError::DustRecipientIsZeroAddress);
    }
    if token == PROTOCOL_TOKEN {
        ledger.transfer_native(holder, recipient, amount)?;
    } else {
        ledger.erc20(token)?.transfer(holder, recipient, amount)?;
    }
    tracing::info!("Sent {} dust of {} from {} to {}", amount, token, holder, recipient);
    Ok(())
}
