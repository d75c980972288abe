//! Wrapped protocol-token transformer.

use alloy_primitives::{Address, U256};

use crate::capability::{standard_transformer_capabilities, CapabilityId};
use crate::context::TransformContext;
use crate::error::TransformerError;
use crate::types::{UnderlyingAmount, PROTOCOL_TOKEN};

use super::{check_deadline, check_recipient, single_entry, Transformer};

/// Transformer between wrapped-native tokens and the protocol token itself.
///
/// Strictly 1:1: every calculation is the identity with list validation.
/// Wrapping consumes attached native value, which must equal the declared
/// amount exactly; unwrapping sends native value onward. After every
/// operation the executing identity holds zero native value.
pub struct ProtocolTokenWrapperTransformer {
    identity: Address,
}

impl ProtocolTokenWrapperTransformer {
    pub fn new(identity: Address) -> Self {
        Self { identity }
    }

    fn check_attached_value(
        ctx: &TransformContext<'_>,
        declared: U256,
    ) -> Result<(), TransformerError> {
        if ctx.value != declared {
            return Err(TransformerError::IncorrectNativeValue {
                declared,
                received: ctx.value,
            });
        }
        Ok(())
    }
}

impl Transformer for ProtocolTokenWrapperTransformer {
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
        Ok(vec![PROTOCOL_TOKEN])
    }

    fn calculate_transform_to_underlying(
        &self,
        _ctx: &TransformContext<'_>,
        _dependent: Address,
        amount_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        Ok(vec![UnderlyingAmount::new(PROTOCOL_TOKEN, amount_dependent)])
    }

    fn calculate_transform_to_dependent(
        &self,
        _ctx: &TransformContext<'_>,
        _dependent: Address,
        underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        single_entry(underlying, PROTOCOL_TOKEN)
    }

    fn calculate_needed_to_transform_to_underlying(
        &self,
        _ctx: &TransformContext<'_>,
        _dependent: Address,
        expected_underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        single_entry(expected_underlying, PROTOCOL_TOKEN)
    }

    fn calculate_needed_to_transform_to_dependent(
        &self,
        _ctx: &TransformContext<'_>,
        _dependent: Address,
        expected_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        Ok(vec![UnderlyingAmount::new(PROTOCOL_TOKEN, expected_dependent)])
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
        let min_out = single_entry(min_amount_out, PROTOCOL_TOKEN)?;
        if amount_dependent < min_out {
            return Err(TransformerError::ReceivedLessThanExpected {
                received: amount_dependent,
            });
        }

        let wrapped = ctx.wrapped_native(dependent)?;
        wrapped.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, amount_dependent)?;
        wrapped.withdraw(ctx.self_address, amount_dependent)?;
        ctx.transfer_native(ctx.self_address, recipient, amount_dependent)?;

        tracing::debug!("Unwrapped {} of {} to native value", amount_dependent, dependent);
        Ok(vec![UnderlyingAmount::new(PROTOCOL_TOKEN, amount_dependent)])
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
        let amount = single_entry(underlying, PROTOCOL_TOKEN)?;
        Self::check_attached_value(ctx, amount)?;
        if amount < min_amount_out {
            return Err(TransformerError::ReceivedLessThanExpected { received: amount });
        }

        let wrapped = ctx.wrapped_native(dependent)?;
        ctx.transfer_native(ctx.caller, ctx.self_address, amount)?;
        wrapped.deposit(ctx.self_address, amount)?;
        wrapped.transfer(ctx.self_address, recipient, amount)?;

        tracing::debug!("Wrapped {} native value into {}", amount, dependent);
        Ok(amount)
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
        let needed = single_entry(expected_underlying, PROTOCOL_TOKEN)?;
        if needed > max_amount_in {
            return Err(TransformerError::NeededMoreThanExpected { needed });
        }

        let wrapped = ctx.wrapped_native(dependent)?;
        wrapped.transfer_from(ctx.self_address, ctx.caller, ctx.self_address, needed)?;
        wrapped.withdraw(ctx.self_address, needed)?;
        ctx.transfer_native(ctx.self_address, recipient, needed)?;
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
        let max_in = single_entry(max_amount_in, PROTOCOL_TOKEN)?;
        if expected_dependent > max_in {
            return Err(TransformerError::NeededMoreThanExpected {
                needed: expected_dependent,
            });
        }
        Self::check_attached_value(ctx, expected_dependent)?;

        let wrapped = ctx.wrapped_native(dependent)?;
        ctx.transfer_native(ctx.caller, ctx.self_address, expected_dependent)?;
        wrapped.deposit(ctx.self_address, expected_dependent)?;
        wrapped.transfer(ctx.self_address, recipient, expected_dependent)?;
        Ok(vec![UnderlyingAmount::new(PROTOCOL_TOKEN, expected_dependent)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InMemoryLedger, Ledger};

    const USER: Address = Address::repeat_byte(0x01);
    const RECIPIENT: Address = Address::repeat_byte(0x02);
    const TRANSFORMER: Address = Address::repeat_byte(0xf1);
    const DEADLINE: u64 = 1600;

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    /// Wrapped-native token plus a user holding 1000 native, clock at 1000.
    fn wrapped_world() -> (InMemoryLedger, Address) {
        let mut ledger = InMemoryLedger::new();
        let wrapped = Address::repeat_byte(0xe0);
        ledger.deploy_wrapped_native(wrapped);
        ledger.mint_native(USER, u(1000));
        ledger.set_timestamp(1000);
        (ledger, wrapped)
    }

    fn ctx(ledger: &InMemoryLedger) -> TransformContext<'_> {
        TransformContext::new(ledger, USER, TRANSFORMER)
    }

    #[test]
    fn test_all_quotes_are_the_identity() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);
        let ctx = ctx(&ledger);

        assert_eq!(
            transformer.get_underlying(&ctx, wrapped),
            Ok(vec![PROTOCOL_TOKEN])
        );
        assert_eq!(
            transformer.calculate_transform_to_underlying(&ctx, wrapped, u(300)),
            Ok(vec![UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))])
        );
        assert_eq!(
            transformer.calculate_transform_to_dependent(
                &ctx,
                wrapped,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))]
            ),
            Ok(u(300))
        );
        assert_eq!(
            transformer.calculate_needed_to_transform_to_underlying(
                &ctx,
                wrapped,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))]
            ),
            Ok(u(300))
        );
        assert_eq!(
            transformer.calculate_needed_to_transform_to_dependent(&ctx, wrapped, u(300)),
            Ok(vec![UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))])
        );
    }

    #[test]
    fn test_quotes_reject_non_protocol_assets() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);

        // The wrapped token itself is not a valid underlying entry.
        assert_eq!(
            transformer.calculate_transform_to_dependent(
                &ctx(&ledger),
                wrapped,
                &[UnderlyingAmount::new(wrapped, u(300))]
            ),
            Err(TransformerError::InvalidUnderlyingInput)
        );
    }

    #[test]
    fn test_transform_to_dependent_wraps_attached_value() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);
        let ctx = ctx(&ledger).with_value(u(400));

        let received = transformer
            .transform_to_dependent(
                &ctx,
                wrapped,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(400))],
                RECIPIENT,
                u(400),
                DEADLINE,
            )
            .unwrap();

        assert_eq!(received, u(400));
        assert_eq!(ledger.erc20(wrapped).unwrap().balance_of(RECIPIENT), u(400));
        assert_eq!(ledger.native_balance(USER), u(600));
        // The wrapped value backs the token on its own address.
        assert_eq!(ledger.native_balance(wrapped), u(400));
        assert_eq!(ledger.native_balance(TRANSFORMER), U256::ZERO);
        assert_eq!(ledger.erc20(wrapped).unwrap().balance_of(TRANSFORMER), U256::ZERO);
    }

    #[test]
    fn test_wrap_requires_exact_attached_value() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);
        let declared = [UnderlyingAmount::new(PROTOCOL_TOKEN, u(400))];

        for attached in [u(399), u(401)] {
            let ctx = ctx(&ledger).with_value(attached);
            assert_eq!(
                transformer.transform_to_dependent(&ctx, wrapped, &declared, RECIPIENT, u(400), DEADLINE),
                Err(TransformerError::IncorrectNativeValue {
                    declared: u(400),
                    received: attached,
                })
            );
        }
        assert_eq!(ledger.native_balance(USER), u(1000));
    }

    #[test]
    fn test_transform_to_underlying_unwraps_to_native() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);
        let ctx = ctx(&ledger);
        ledger.wrapped_native(wrapped).unwrap().deposit(USER, u(500)).unwrap();

        ledger.erc20(wrapped).unwrap().approve(USER, TRANSFORMER, u(300)).unwrap();
        let received = transformer
            .transform_to_underlying(
                &ctx,
                wrapped,
                u(300),
                RECIPIENT,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))],
                DEADLINE,
            )
            .unwrap();

        assert_eq!(received, vec![UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))]);
        assert_eq!(ledger.native_balance(RECIPIENT), u(300));
        assert_eq!(ledger.erc20(wrapped).unwrap().balance_of(USER), u(200));
        assert_eq!(ledger.native_balance(TRANSFORMER), U256::ZERO);
    }

    #[test]
    fn test_min_out_checked_before_any_movement() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);
        let ctx = ctx(&ledger);
        ledger.wrapped_native(wrapped).unwrap().deposit(USER, u(500)).unwrap();

        assert_eq!(
            transformer.transform_to_underlying(
                &ctx,
                wrapped,
                u(300),
                RECIPIENT,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(301))],
                DEADLINE,
            ),
            Err(TransformerError::ReceivedLessThanExpected { received: u(300) })
        );
        assert_eq!(ledger.erc20(wrapped).unwrap().balance_of(USER), u(500));
    }

    #[test]
    fn test_expected_underlying_respects_ceiling() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);
        let ctx = ctx(&ledger);
        ledger.wrapped_native(wrapped).unwrap().deposit(USER, u(500)).unwrap();
        let expected = [UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))];

        assert_eq!(
            transformer.transform_to_expected_underlying(
                &ctx, wrapped, &expected, RECIPIENT, u(299), DEADLINE,
            ),
            Err(TransformerError::NeededMoreThanExpected { needed: u(300) })
        );

        ledger.erc20(wrapped).unwrap().approve(USER, TRANSFORMER, u(300)).unwrap();
        let spent = transformer
            .transform_to_expected_underlying(&ctx, wrapped, &expected, RECIPIENT, u(300), DEADLINE)
            .unwrap();
        assert_eq!(spent, u(300));
        assert_eq!(ledger.native_balance(RECIPIENT), u(300));
    }

    #[test]
    fn test_expected_dependent_checks_bound_then_value() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);

        assert_eq!(
            transformer.transform_to_expected_dependent(
                &ctx(&ledger),
                wrapped,
                u(300),
                RECIPIENT,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(299))],
                DEADLINE,
            ),
            Err(TransformerError::NeededMoreThanExpected { needed: u(300) })
        );

        // Bound passes but no value came along.
        assert_eq!(
            transformer.transform_to_expected_dependent(
                &ctx(&ledger),
                wrapped,
                u(300),
                RECIPIENT,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))],
                DEADLINE,
            ),
            Err(TransformerError::IncorrectNativeValue {
                declared: u(300),
                received: U256::ZERO,
            })
        );

        let ctx = ctx(&ledger).with_value(u(300));
        let spent = transformer
            .transform_to_expected_dependent(
                &ctx,
                wrapped,
                u(300),
                RECIPIENT,
                &[UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))],
                DEADLINE,
            )
            .unwrap();
        assert_eq!(spent, vec![UnderlyingAmount::new(PROTOCOL_TOKEN, u(300))]);
        assert_eq!(ledger.erc20(wrapped).unwrap().balance_of(RECIPIENT), u(300));
    }

    #[test]
    fn test_expired_deadline_reported_first() {
        let (ledger, wrapped) = wrapped_world();
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);

        assert_eq!(
            transformer.transform_to_dependent(
                &ctx(&ledger),
                wrapped,
                &[],
                Address::ZERO,
                u(0),
                999,
            ),
            Err(TransformerError::TransactionExpired { deadline: 999, now: 1000 })
        );
    }

    #[test]
    fn test_capability_answers() {
        let transformer = ProtocolTokenWrapperTransformer::new(TRANSFORMER);
        assert!(transformer.supports_capability(CapabilityId::probe()));
        assert!(transformer.supports_capability(CapabilityId::transform()));
        assert!(!transformer.supports_capability(CapabilityId::INVALID));
    }
}
