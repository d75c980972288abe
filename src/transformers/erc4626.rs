//! Tokenized-vault transformer.

use alloy_primitives::{Address, U256};

use crate::capability::{standard_transformer_capabilities, CapabilityId};
use crate::context::TransformContext;
use crate::error::TransformerError;
use crate::types::UnderlyingAmount;

use super::{check_deadline, check_recipient, single_entry, Transformer};

/// Transformer for EIP-4626 style vaults: the dependent is the vault's share
/// token, the underlying is the vault's single backing asset.
///
/// The vault owns all conversion math. Estimates delegate to its preview
/// functions; executions reconcile against what the vault actually moved.
/// One instance serves any number of vaults.
pub struct Erc4626Transformer {
    identity: Address,
}

impl Erc4626Transformer {
    pub fn new(identity: Address) -> Self {
        Self { identity }
    }
}

impl Transformer for Erc4626Transformer {
    fn identity(&self) -> Address {
        self.identity
    }

    fn supports_capability(&self, capability: CapabilityId) -> bool {
        standard_transformer_capabilities(capability)
    }

    fn get_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
    ) -> Result<Vec<Address>, TransformerError> {
        let vault = ctx.erc4626(dependent)?;
        Ok(vec![vault.asset()])
    }

    fn calculate_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        amount_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        let vault = ctx.erc4626(dependent)?;
        let amount = vault.preview_redeem(amount_dependent);
        Ok(vec![UnderlyingAmount::new(vault.asset(), amount)])
    }

    fn calculate_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        let vault = ctx.erc4626(dependent)?;
        let amount = single_entry(underlying, vault.asset())?;
        Ok(vault.preview_deposit(amount))
    }

    fn calculate_needed_to_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        let vault = ctx.erc4626(dependent)?;
        let expected = single_entry(expected_underlying, vault.asset())?;
        Ok(vault.preview_withdraw(expected))
    }

    fn calculate_needed_to_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        let vault = ctx.erc4626(dependent)?;
        let needed = vault.preview_mint(expected_dependent);
        Ok(vec![UnderlyingAmount::new(vault.asset(), needed)])
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
        let vault = ctx.erc4626(dependent)?;
        let asset = vault.asset();
        let min_out = single_entry(min_amount_out, asset)?;

        let received = vault.redeem(ctx.self_address, amount_dependent, ctx.self_address, ctx.caller)?;
        if received < min_out {
            return Err(TransformerError::ReceivedLessThanExpected { received });
        }
        ctx.erc20(asset)?.transfer(ctx.self_address, recipient, received)?;

        tracing::debug!(
            "Redeemed {} vault shares of {} into {} underlying",
            amount_dependent,
            dependent,
            received
        );
        Ok(vec![UnderlyingAmount::new(asset, received)])
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
        let vault = ctx.erc4626(dependent)?;
        let asset = vault.asset();
        let amount = single_entry(underlying, asset)?;

        let asset_token = ctx.erc20(asset)?;
        asset_token.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, amount)?;
        asset_token.approve(ctx.self_address, dependent, amount)?;
        let received = vault.deposit(ctx.self_address, amount, ctx.self_address)?;
        if received < min_amount_out {
            return Err(TransformerError::ReceivedLessThanExpected { received });
        }
        vault.transfer(ctx.self_address, recipient, received)?;
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
        let vault = ctx.erc4626(dependent)?;
        let asset = vault.asset();
        let expected = single_entry(expected_underlying, asset)?;

        let needed = vault.withdraw(ctx.self_address, expected, ctx.self_address, ctx.caller)?;
        if needed > max_amount_in {
            return Err(TransformerError::NeededMoreThanExpected { needed });
        }
        ctx.erc20(asset)?.transfer(ctx.self_address, recipient, expected)?;
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
        let vault = ctx.erc4626(dependent)?;
        let asset = vault.asset();
        let max_in = single_entry(max_amount_in, asset)?;

        let needed = vault.preview_mint(expected_dependent);
        let asset_token = ctx.erc20(asset)?;
        asset_token.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, needed)?;
        asset_token.approve(ctx.self_address, dependent, needed)?;
        let spent = vault.mint(ctx.self_address, expected_dependent, ctx.self_address)?;
        if spent > max_in {
            return Err(TransformerError::NeededMoreThanExpected { needed: spent });
        }
        if spent < needed {
            // The preview over-quoted. Return the difference and revoke the
            // part of the approval the vault did not pull.
            asset_token.transfer(ctx.self_address, ctx.caller, needed - spent)?;
            asset_token.approve(ctx.self_address, dependent, U256::ZERO)?;
            tracing::debug!(
                "Vault {} mint spent {} of {} quoted, refunded surplus",
                dependent,
                spent,
                needed
            );
        }
        vault.transfer(ctx.self_address, recipient, expected_dependent)?;
        Ok(vec![UnderlyingAmount::new(asset, spent)])
    }
}
