//! Rebasing staked-token transformer.

use alloy_primitives::{Address, U256};

use crate::capability::{standard_transformer_capabilities, CapabilityId};
use crate::context::TransformContext;
use crate::error::TransformerError;
use crate::types::UnderlyingAmount;

use super::math::mul_div_up;
use super::{check_deadline, check_recipient, single_entry, Transformer};

/// Transformer between non-rebasing wrappers and the rebasing staked token
/// they wrap.
///
/// The staked token's own share math prices every conversion. Its
/// share-to-pooled conversions floor, so the needed-amount calculations
/// round up by one unit whenever the division is inexact; executions then
/// compare the wrap/unwrap actuals against the caller's bounds.
pub struct StakedTokenTransformer {
    identity: Address,
    staked: Address,
}

impl StakedTokenTransformer {
    /// `staked` is the rebasing token every dependent of this transformer
    /// must wrap.
    pub fn new(identity: Address, staked: Address) -> Self {
        Self { identity, staked }
    }

    pub fn staked_token(&self) -> Address {
        self.staked
    }
}

impl Transformer for StakedTokenTransformer {
    fn identity(&self) -> Address {
        self.identity
    }

    fn supports_capability(&self, capability: CapabilityId) -> bool {
        standard_transformer_capabilities(capability)
    }

    fn get_underlying(
        &self,
        _ctx: &TransformContext<'_>,
        _dependent: Address,
    ) -> Result<Vec<Address>, TransformerError> {
        Ok(vec![self.staked])
    }

    fn calculate_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        _dependent: Address,
        amount_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        let staked = ctx.staked_token(self.staked)?;
        let pooled = staked.get_pooled_eth_by_shares(amount_dependent);
        Ok(vec![UnderlyingAmount::new(self.staked, pooled)])
    }

    fn calculate_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        _dependent: Address,
        underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        let amount = single_entry(underlying, self.staked)?;
        let staked = ctx.staked_token(self.staked)?;
        Ok(staked.get_shares_by_pooled_eth(amount))
    }

    fn calculate_needed_to_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        _dependent: Address,
        expected_underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        let expected = single_entry(expected_underlying, self.staked)?;
        let staked = ctx.staked_token(self.staked)?;
        mul_div_up(expected, staked.get_total_shares(), staked.total_supply())
    }

    fn calculate_needed_to_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        _dependent: Address,
        expected_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        let staked = ctx.staked_token(self.staked)?;
        let needed = mul_div_up(
            expected_dependent,
            staked.total_supply(),
            staked.get_total_shares(),
        )?;
        Ok(vec![UnderlyingAmount::new(self.staked, needed)])
    }

    fn transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        amount_dependent: U256,
        recipient: Address,
        min_amount_out: &[UnderlyingAmount],
        deadline: u64,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        check_deadline(ctx, deadline)?;
        check_recipient(recipient)?;
        let min_out = single_entry(min_amount_out, self.staked)?;

        let wrapper = ctx.wrapped_staked(dependent)?;
        wrapper.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, amount_dependent)?;
        let received = wrapper.unwrap(ctx.self_address, amount_dependent)?;
        if received < min_out {
            return Err(TransformerError::ReceivedLessThanExpected { received });
        }
        ctx.erc20(self.staked)?
            .transfer(ctx.self_address, recipient, received)?;

        tracing::debug!(
            "Unwrapped {} of {} into {} staked units",
            amount_dependent,
            dependent,
            received
        );
        Ok(vec![UnderlyingAmount::new(self.staked, received)])
    }

    fn transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        underlying: &[UnderlyingAmount],
        recipient: Address,
        min_amount_out: U256,
        deadline: u64,
    ) -> Result<U256, TransformerError> {
        check_deadline(ctx, deadline)?;
        check_recipient(recipient)?;
        let amount = single_entry(underlying, self.staked)?;

        let wrapper = ctx.wrapped_staked(dependent)?;
        let staked = ctx.erc20(self.staked)?;
        staked.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, amount)?;
        staked.approve(ctx.self_address, dependent, amount)?;
        let received = wrapper.wrap(ctx.self_address, amount)?;
        if received < min_amount_out {
            return Err(TransformerError::ReceivedLessThanExpected { received });
        }
        wrapper.transfer(ctx.self_address, recipient, received)?;
        Ok(received)
    }

    fn transform_to_expected_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_underlying: &[UnderlyingAmount],
        recipient: Address,
        max_amount_in: U256,
        deadline: u64,
    ) -> Result<U256, TransformerError> {
        check_deadline(ctx, deadline)?;
        check_recipient(recipient)?;
        let expected = single_entry(expected_underlying, self.staked)?;

        let staked = ctx.staked_token(self.staked)?;
        let needed = mul_div_up(expected, staked.get_total_shares(), staked.total_supply())?;
        if needed > max_amount_in {
            return Err(TransformerError::NeededMoreThanExpected { needed });
        }

        let wrapper = ctx.wrapped_staked(dependent)?;
        wrapper.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, needed)?;
        let received = wrapper.unwrap(ctx.self_address, needed)?;
        if received < expected {
            return Err(TransformerError::ReceivedLessThanExpected { received });
        }
        ctx.erc20(self.staked)?
            .transfer(ctx.self_address, recipient, received)?;
        Ok(needed)
    }

    fn transform_to_expected_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_dependent: U256,
        recipient: Address,
        max_amount_in: &[UnderlyingAmount],
        deadline: u64,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        check_deadline(ctx, deadline)?;
        check_recipient(recipient)?;
        let max_in = single_entry(max_amount_in, self.staked)?;

        let staked = ctx.staked_token(self.staked)?;
        let needed = mul_div_up(
            expected_dependent,
            staked.total_supply(),
            staked.get_total_shares(),
        )?;
        if needed > max_in {
            return Err(TransformerError::NeededMoreThanExpected { needed });
        }

        let wrapper = ctx.wrapped_staked(dependent)?;
        let staked_erc20 = ctx.erc20(self.staked)?;
        staked_erc20.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, needed)?;
        staked_erc20.approve(ctx.self_address, dependent, needed)?;
        let received = wrapper.wrap(ctx.self_address, needed)?;
        if received < expected_dependent {
            return Err(TransformerError::ReceivedLessThanExpected { received });
        }
        wrapper.transfer(ctx.self_address, recipient, received)?;
        Ok(vec![UnderlyingAmount::new(self.staked, needed)])
    }
}
