//! Protocol error types.

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::tokens::TokenError;

/// Every way a transformer or registry call can fail.
///
/// Failures abort the whole call; the execution frame guarantees no partial
/// transfer survives an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformerError {
    /// An underlying list had the wrong length, or an entry named an asset
    /// the dependent does not decompose into at that position.
    #[error("invalid underlying input")]
    InvalidUnderlyingInput,

    /// A conversion produced less than the caller's floor.
    #[error("received {received}, less than expected")]
    ReceivedLessThanExpected { received: U256 },

    /// A conversion needed more input than the caller's ceiling.
    #[error("needed {needed}, more than expected")]
    NeededMoreThanExpected { needed: U256 },

    /// The call arrived after its absolute deadline. Checked before anything
    /// else, so an expired call never reports a different failure.
    #[error("transaction expired: deadline {deadline}, now {now}")]
    TransactionExpired { deadline: u64, now: u64 },

    #[error("caller is not the governor")]
    OnlyGovernor,

    #[error("caller is not the pending governor")]
    OnlyPendingGovernor,

    #[error("governor is the zero address")]
    GovernorIsZeroAddress,

    #[error("no transformer registered for dependent {dependent}")]
    NoTransformerRegistered { dependent: Address },

    #[error("{candidate} is not a transformer")]
    AddressIsNotTransformer { candidate: Address },

    #[error("recipient is the zero address")]
    RecipientIsZeroAddress,

    #[error("dust recipient is the zero address")]
    DustRecipientIsZeroAddress,

    #[error("attached native value {received} does not match declared amount {declared}")]
    IncorrectNativeValue { declared: U256, received: U256 },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("token error: {0}")]
    Token(#[from] TokenError),
}
