//! Uniform conversion interface between dependent tokenized assets and the
//! underlying assets backing them.
//!
//! This module provides:
//! - The [`Transformer`] trait: nine operations every adapter implements
//! - Three concrete transformers (tokenized vaults, the wrapped protocol
//!   token, rebasing staked tokens)
//! - Shared validation helpers enforcing the common check order
//!
//! # Architecture
//!
//! ```text
//! Caller ──► TransformerRegistry ──► Transformer ──► asset contracts
//!                 │                       │            (vault previews,
//!                 └─ dependent ──► Arc<dyn Transformer> wrap/unwrap,
//!                                         │            share math)
//!                                         └─► TransformContext
//!                                              ├─ caller / attached value
//!                                              ├─ executing identity
//!                                              └─ ledger host
//! ```
//!
//! Every value-moving operation validates in the same order: deadline first,
//! then the recipient, then input lists, and only then touches funds.
//! Conversions land on the executing identity and are forwarded to the
//! recipient only after slippage floors and ceilings pass.

pub mod erc4626;
pub mod math;
pub mod protocol_token;
pub mod staked;

use alloy_primitives::{Address, U256};

use crate::capability::CapabilityId;
use crate::context::TransformContext;
use crate::error::TransformerError;
use crate::types::UnderlyingAmount;

pub use erc4626::Erc4626Transformer;
pub use protocol_token::ProtocolTokenWrapperTransformer;
pub use staked::StakedTokenTransformer;

/// A conversion adapter between one family of dependent assets and their
/// underlying assets.
///
/// Transformers are stateless with respect to conversions: no balances or
/// positions survive between calls. Construction parameters (identity, a
/// backing token address) are configuration.
///
/// `calculate_*` operations are read-only estimates delegating to the asset
/// contracts' own quoting functions. `transform_*` operations move funds and
/// take a recipient, slippage bounds, and an absolute deadline.
pub trait Transformer {
    /// The address this component is known by.
    fn identity(&self) -> Address;

    /// Runtime capability probe. Unknown ids answer `false`, never an error.
    fn supports_capability(&self, capability: CapabilityId) -> bool;

    /// The underlying asset(s) backing `dependent`, in canonical order.
    /// Every list-typed input and output follows this order.
    fn get_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
    ) -> Result<Vec<Address>, TransformerError>;

    /// Underlying received for converting `amount_dependent`.
    fn calculate_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        amount_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError>;

    /// Dependent received for converting the given underlying amounts.
    fn calculate_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError>;

    /// Dependent needed to obtain at least the expected underlying amounts.
    fn calculate_needed_to_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError>;

    /// Underlying needed to obtain at least `expected_dependent`.
    fn calculate_needed_to_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError>;

    /// Pull `amount_dependent` from the caller, convert, deliver the actual
    /// underlying to `recipient`. Fails with `ReceivedLessThanExpected` if
    /// any resulting amount is below the caller's floor.
    fn transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        amount_dependent: U256,
        recipient: Address,
        min_amount_out: &[UnderlyingAmount],
        deadline: u64,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError>;

    /// Pull the given underlying amounts from the caller, convert, deliver
    /// the actual dependent to `recipient`. Fails with
    /// `ReceivedLessThanExpected` below `min_amount_out`.
    fn transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        underlying: &[UnderlyingAmount],
        recipient: Address,
        min_amount_out: U256,
        deadline: u64,
    ) -> Result<U256, TransformerError>;

    /// Deliver exactly the expected underlying amounts to `recipient`,
    /// pulling whatever dependent that takes from the caller. Fails with
    /// `NeededMoreThanExpected` above `max_amount_in`. Returns the dependent
    /// actually spent.
    fn transform_to_expected_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_underlying: &[UnderlyingAmount],
        recipient: Address,
        max_amount_in: U256,
        deadline: u64,
    ) -> Result<U256, TransformerError>;

    /// Deliver exactly `expected_dependent` to `recipient`, pulling whatever
    /// underlying that takes from the caller (bounded per asset by
    /// `max_amount_in`). Refunds any unspent surplus when the backing
    /// mechanism over-collects. Returns the underlying actually spent.
    fn transform_to_expected_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_dependent: U256,
        recipient: Address,
        max_amount_in: &[UnderlyingAmount],
        deadline: u64,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError>;
}

/// Deadline gate. Runs before any other validation so an expired call always
/// reports expiry, whatever else is wrong with it.
pub(crate) fn check_deadline(
    ctx: &TransformContext<'_>,
    deadline: u64,
) -> Result<(), TransformerError> {
    let now = ctx.timestamp();
    if now > deadline {
        return Err(TransformerError::TransactionExpired { deadline, now });
    }
    Ok(())
}

/// Funds never go to the zero address.
pub(crate) fn check_recipient(recipient: Address) -> Result<(), TransformerError> {
    if recipient == Address::ZERO {
        return Err(TransformerError::RecipientIsZeroAddress);
    }
    Ok(())
}

/// Validates a single-underlying list: exactly one entry, naming `underlying`.
/// Returns the entry's amount.
pub(crate) fn single_entry(
    input: &[UnderlyingAmount],
    underlying: Address,
) -> Result<U256, TransformerError> {
    match input {
        [entry] if entry.underlying == underlying => Ok(entry.amount),
        _ => Err(TransformerError::InvalidUnderlyingInput),
    }
}
