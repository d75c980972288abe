//! Transformer registration and dispatch.
//!
//! The registry maintains a mapping from dependent assets to the transformer
//! serving them, behind a two-step-governed admission gate. Interface calls
//! pass through verbatim: the registry resolves the dependent, forwards the
//! call with the caller's context unchanged, and returns the result as-is,
//! so conversions run under the registry's identity and spend allowances
//! granted to it.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};

use crate::capability::{standard_transformer_capabilities, CapabilityId};
use crate::context::TransformContext;
use crate::dust::{self, TokenBalance};
use crate::error::TransformerError;
use crate::governance::Governance;
use crate::ledger::Ledger;
use crate::transformers::Transformer;
use crate::types::{UnderlyingAmount, PROTOCOL_TOKEN};

/// One registration request: a transformer and the dependents it serves.
#[derive(Clone)]
pub struct TransformerRegistration {
    pub transformer: Arc<dyn Transformer>,
    pub dependents: Vec<Address>,
}

impl TransformerRegistration {
    pub fn new(transformer: Arc<dyn Transformer>, dependents: Vec<Address>) -> Self {
        Self {
            transformer,
            dependents,
        }
    }
}

/// Dispatch table from dependent assets to transformers.
///
/// The registry is itself a [`Transformer`]: callers can hold one address
/// and convert any registered dependent through it.
pub struct TransformerRegistry {
    identity: Address,
    governance: Governance,
    transformers: HashMap<Address, Arc<dyn Transformer>>,
}

impl TransformerRegistry {
    pub fn new(identity: Address, governor: Address) -> Result<Self, TransformerError> {
        Ok(Self {
            identity,
            governance: Governance::new(governor)?,
            transformers: HashMap::new(),
        })
    }

    // Governance surface.

    pub fn governor(&self) -> Address {
        self.governance.governor()
    }

    pub fn pending_governor(&self) -> Option<Address> {
        self.governance.pending_governor()
    }

    pub fn is_governor(&self, account: Address) -> bool {
        self.governance.is_governor(account)
    }

    pub fn is_pending_governor(&self, account: Address) -> bool {
        self.governance.is_pending_governor(account)
    }

    pub fn set_pending_governor(
        &mut self,
        caller: Address,
        pending: Address,
    ) -> Result<(), TransformerError> {
        self.governance.set_pending_governor(caller, pending)
    }

    pub fn accept_pending_governor(&mut self, caller: Address) -> Result<(), TransformerError> {
        self.governance.accept_pending_governor(caller)
    }

    // Registration.

    /// Admission probe: a candidate must carry a real identity, refuse the
    /// reserved invalid id, and claim both the probe and transform
    /// capabilities.
    fn validate_candidate(candidate: &dyn Transformer) -> Result<(), TransformerError> {
        let admissible = candidate.identity() != Address::ZERO
            && !candidate.supports_capability(CapabilityId::INVALID)
            && candidate.supports_capability(CapabilityId::probe())
            && candidate.supports_capability(CapabilityId::transform());
        if !admissible {
            return Err(TransformerError::AddressIsNotTransformer {
                candidate: candidate.identity(),
            });
        }
        Ok(())
    }

    /// Register transformers for the dependents they serve. Governor-only.
    ///
    /// The whole batch is validated before any mapping is written, so a bad
    /// candidate anywhere aborts the batch without partial registrations.
    /// Registering a dependent again overwrites its mapping.
    pub fn register_transformers(
        &mut self,
        caller: Address,
        registrations: Vec<TransformerRegistration>,
    ) -> Result<(), TransformerError> {
        self.governance.ensure_governor(caller)?;
        for registration in &registrations {
            Self::validate_candidate(registration.transformer.as_ref())?;
        }
        for registration in registrations {
            for dependent in &registration.dependents {
                self.transformers
                    .insert(*dependent, registration.transformer.clone());
            }
            tracing::info!(
                "Registered transformer {} for {} dependent(s)",
                registration.transformer.identity(),
                registration.dependents.len()
            );
        }
        Ok(())
    }

    /// Drop the mapping for each dependent. Governor-only. Unmapped
    /// dependents are no-ops, so removal is idempotent.
    pub fn remove_transformers(
        &mut self,
        caller: Address,
        dependents: Vec<Address>,
    ) -> Result<(), TransformerError> {
        self.governance.ensure_governor(caller)?;
        for dependent in &dependents {
            self.transformers.remove(dependent);
        }
        tracing::info!("Removed transformers for {} dependent(s)", dependents.len());
        Ok(())
    }

    /// Registered transformer address per dependent, zero when unmapped.
    pub fn transformers(&self, dependents: &[Address]) -> Vec<Address> {
        dependents
            .iter()
            .map(|dependent| {
                self.transformers
                    .get(dependent)
                    .map(|transformer| transformer.identity())
                    .unwrap_or(Address::ZERO)
            })
            .collect()
    }

    /// Count of mapped dependents.
    pub fn registered_count(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    fn resolved(&self, dependent: Address) -> Result<&Arc<dyn Transformer>, TransformerError> {
        self.transformers
            .get(&dependent)
            .ok_or(TransformerError::NoTransformerRegistered { dependent })
    }

    // Balance-aware entry points.

    /// Convert the caller's entire dependent balance to underlying.
    pub fn transform_all_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        recipient: Address,
        min_amount_out: &[UnderlyingAmount],
        deadline: u64,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        let transformer = self.resolved(dependent)?;
        let balance = ctx.erc20(dependent)?.balance_of(ctx.caller);
        tracing::debug!(
            "Transforming full balance {} of {} for {}",
            balance,
            dependent,
            ctx.caller
        );
        transformer.transform_to_underlying(ctx, dependent, balance, recipient, min_amount_out, deadline)
    }

    /// Convert the caller's entire underlying balances to dependent. For the
    /// protocol token the attached value stands in for a balance.
    pub fn transform_all_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        recipient: Address,
        min_amount_out: U256,
        deadline: u64,
    ) -> Result<U256, TransformerError> {
        let transformer = self.resolved(dependent)?;
        let underlying = transformer.get_underlying(ctx, dependent)?;
        let mut amounts = Vec::with_capacity(underlying.len());
        for asset in underlying {
            let amount = if asset == PROTOCOL_TOKEN {
                ctx.value
            } else {
                ctx.erc20(asset)?.balance_of(ctx.caller)
            };
            amounts.push(UnderlyingAmount::new(asset, amount));
        }
        transformer.transform_to_dependent(ctx, dependent, &amounts, recipient, min_amount_out, deadline)
    }

    // Dust recovery.

    /// Registry-held balance in each of `tokens`.
    pub fn dust_balances(
        &self,
        ledger: &dyn Ledger,
        tokens: &[Address],
    ) -> Result<Vec<TokenBalance>, TransformerError> {
        dust::balances(ledger, self.identity, tokens)
    }

    /// Sweep funds stranded on the registry. Governor-only.
    pub fn send_dust(
        &self,
        ctx: &TransformContext<'_>,
        token: Address,
        amount: U256,
        recipient: Address,
    ) -> Result<(), TransformerError> {
        self.governance.ensure_governor(ctx.caller)?;
        dust::send_dust(ctx.ledger(), self.identity, token, amount, recipient)
    }
}

impl Transformer for TransformerRegistry {
    fn identity(&self) -> Address {
        self.identity
    }

    fn supports_capability(&self, capability: CapabilityId) -> bool {
        standard_transformer_capabilities(capability)
            || capability == CapabilityId::collectable_dust()
    }

    fn get_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
    ) -> Result<Vec<Address>, TransformerError> {
        self.resolved(dependent)?.get_underlying(ctx, dependent)
    }

    fn calculate_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        amount_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        self.resolved(dependent)?
            .calculate_transform_to_underlying(ctx, dependent, amount_dependent)
    }

    fn calculate_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        self.resolved(dependent)?
            .calculate_transform_to_dependent(ctx, dependent, underlying)
    }

    fn calculate_needed_to_transform_to_underlying(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_underlying: &[UnderlyingAmount],
    ) -> Result<U256, TransformerError> {
        self.resolved(dependent)?
            .calculate_needed_to_transform_to_underlying(ctx, dependent, expected_underlying)
    }

    fn calculate_needed_to_transform_to_dependent(
        &self,
        ctx: &TransformContext<'_>,
        dependent: Address,
        expected_dependent: U256,
    ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
        self.resolved(dependent)?
            .calculate_needed_to_transform_to_dependent(ctx, dependent, expected_dependent)
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
        self.resolved(dependent)?.transform_to_underlying(
            ctx,
            dependent,
            amount_dependent,
            recipient,
            min_amount_out,
            deadline,
        )
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
        self.resolved(dependent)?.transform_to_dependent(
            ctx,
            dependent,
            underlying,
            recipient,
            min_amount_out,
            deadline,
        )
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
        self.resolved(dependent)?.transform_to_expected_underlying(
            ctx,
            dependent,
            expected_underlying,
            recipient,
            max_amount_in,
            deadline,
        )
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
        self.resolved(dependent)?.transform_to_expected_dependent(
            ctx,
            dependent,
            expected_dependent,
            recipient,
            max_amount_in,
            deadline,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::transformers::{Erc4626Transformer, ProtocolTokenWrapperTransformer};

    const GOVERNOR: Address = Address::repeat_byte(0x0a);
    const USER: Address = Address::repeat_byte(0x01);
    const RECIPIENT: Address = Address::repeat_byte(0x02);
    const REGISTRY: Address = Address::repeat_byte(0x99);
    const VAULT_TRANSFORMER: Address = Address::repeat_byte(0xf0);
    const WRAPPER_TRANSFORMER: Address = Address::repeat_byte(0xf1);
    const DEADLINE: u64 = 1600;

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    /// Candidate with a controllable capability surface, for admission tests.
    /// Registration only probes identity and capabilities, so the conversion
    /// operations are never reached.
    struct CandidateTransformer {
        identity: Address,
        standard: bool,
        answers_invalid: bool,
    }

    impl CandidateTransformer {
        fn admissible(identity: Address) -> Self {
            Self {
                identity,
                standard: true,
                answers_invalid: false,
            }
        }
    }

    impl Transformer for CandidateTransformer {
        fn identity(&self) -> Address {
            self.identity
        }

        fn supports_capability(&self, capability: CapabilityId) -> bool {
            if capability == CapabilityId::INVALID {
                self.answers_invalid
            } else {
                self.standard && standard_transformer_capabilities(capability)
            }
        }

        fn get_underlying(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
        ) -> Result<Vec<Address>, TransformerError> {
            unimplemented!()
        }

        fn calculate_transform_to_underlying(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _amount_dependent: U256,
        ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
            unimplemented!()
        }

        fn calculate_transform_to_dependent(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _underlying: &[UnderlyingAmount],
        ) -> Result<U256, TransformerError> {
            unimplemented!()
        }

        fn calculate_needed_to_transform_to_underlying(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _expected_underlying: &[UnderlyingAmount],
        ) -> Result<U256, TransformerError> {
            unimplemented!()
        }

        fn calculate_needed_to_transform_to_dependent(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _expected_dependent: U256,
        ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
            unimplemented!()
        }

        fn transform_to_underlying(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _amount_dependent: U256,
            _recipient: Address,
            _min_amount_out: &[UnderlyingAmount],
            _deadline: u64,
        ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
            unimplemented!()
        }

        fn transform_to_dependent(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _underlying: &[UnderlyingAmount],
            _recipient: Address,
            _min_amount_out: U256,
            _deadline: u64,
        ) -> Result<U256, TransformerError> {
            unimplemented!()
        }

        fn transform_to_expected_underlying(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _expected_underlying: &[UnderlyingAmount],
            _recipient: Address,
            _max_amount_in: U256,
            _deadline: u64,
        ) -> Result<U256, TransformerError> {
            unimplemented!()
        }

        fn transform_to_expected_dependent(
            &self,
            _ctx: &TransformContext<'_>,
            _dependent: Address,
            _expected_dependent: U256,
            _recipient: Address,
            _max_amount_in: &[UnderlyingAmount],
            _deadline: u64,
        ) -> Result<Vec<UnderlyingAmount>, TransformerError> {
            unimplemented!()
        }
    }

    fn registration(candidate: CandidateTransformer, dependents: Vec<Address>) -> TransformerRegistration {
        TransformerRegistration::new(Arc::new(candidate), dependents)
    }

    /// Vault world in which the user holds every share: 100_000 shares over
    /// 12_345_678 assets, clock at 1000.
    fn vault_world() -> (InMemoryLedger, Address, Address) {
        let mut ledger = InMemoryLedger::new();
        let asset = Address::repeat_byte(0xa0);
        let vault = Address::repeat_byte(0xb0);
        ledger.deploy_erc20(asset);
        ledger.deploy_vault(vault, asset);
        ledger.mint_erc20(vault, USER, u(100_000));
        ledger.mint_erc20(asset, vault, u(12_345_678));
        ledger.set_timestamp(1000);
        (ledger, asset, vault)
    }

    fn vault_registry(vault: Address) -> TransformerRegistry {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        registry
            .register_transformers(
                GOVERNOR,
                vec![TransformerRegistration::new(
                    Arc::new(Erc4626Transformer::new(VAULT_TRANSFORMER)),
                    vec![vault],
                )],
            )
            .unwrap();
        registry
    }

    fn user_ctx(ledger: &InMemoryLedger) -> TransformContext<'_> {
        TransformContext::new(ledger, USER, REGISTRY)
    }

    #[test]
    fn test_rejects_candidate_with_zero_identity() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let result = registry.register_transformers(
            GOVERNOR,
            vec![registration(
                CandidateTransformer::admissible(Address::ZERO),
                vec![Address::repeat_byte(0x30)],
            )],
        );
        assert_eq!(
            result,
            Err(TransformerError::AddressIsNotTransformer { candidate: Address::ZERO })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejects_candidate_answering_the_invalid_capability() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let mut candidate = CandidateTransformer::admissible(Address::repeat_byte(0x40));
        candidate.answers_invalid = true;
        let result = registry.register_transformers(
            GOVERNOR,
            vec![registration(candidate, vec![Address::repeat_byte(0x30)])],
        );
        assert_eq!(
            result,
            Err(TransformerError::AddressIsNotTransformer {
                candidate: Address::repeat_byte(0x40),
            })
        );
    }

    #[test]
    fn test_rejects_candidate_without_standard_capabilities() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let mut candidate = CandidateTransformer::admissible(Address::repeat_byte(0x40));
        candidate.standard = false;
        let result = registry.register_transformers(
            GOVERNOR,
            vec![registration(candidate, vec![Address::repeat_byte(0x30)])],
        );
        assert_eq!(
            result,
            Err(TransformerError::AddressIsNotTransformer {
                candidate: Address::repeat_byte(0x40),
            })
        );
    }

    #[test]
    fn test_bad_candidate_aborts_the_whole_batch() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let dependent_a = Address::repeat_byte(0x30);
        let dependent_b = Address::repeat_byte(0x31);
        let good = registration(
            CandidateTransformer::admissible(Address::repeat_byte(0x40)),
            vec![dependent_a],
        );
        let bad = registration(CandidateTransformer::admissible(Address::ZERO), vec![dependent_b]);

        assert!(registry.register_transformers(GOVERNOR, vec![good, bad]).is_err());
        assert_eq!(
            registry.transformers(&[dependent_a, dependent_b]),
            vec![Address::ZERO, Address::ZERO]
        );
        assert_eq!(registry.registered_count(), 0);
    }

    #[test]
    fn test_registration_and_removal_are_governor_only() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let candidate = registration(
            CandidateTransformer::admissible(Address::repeat_byte(0x40)),
            vec![Address::repeat_byte(0x30)],
        );
        assert_eq!(
            registry.register_transformers(USER, vec![candidate]),
            Err(TransformerError::OnlyGovernor)
        );
        assert_eq!(
            registry.remove_transformers(USER, vec![Address::repeat_byte(0x30)]),
            Err(TransformerError::OnlyGovernor)
        );
    }

    #[test]
    fn test_lookup_returns_zero_for_unmapped_and_removal_is_idempotent() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let dependent = Address::repeat_byte(0x30);
        let unmapped = Address::repeat_byte(0x31);
        let identity = Address::repeat_byte(0x40);
        registry
            .register_transformers(
                GOVERNOR,
                vec![registration(CandidateTransformer::admissible(identity), vec![dependent])],
            )
            .unwrap();

        assert_eq!(registry.transformers(&[dependent, unmapped]), vec![identity, Address::ZERO]);

        registry.remove_transformers(GOVERNOR, vec![dependent, unmapped]).unwrap();
        assert_eq!(registry.transformers(&[dependent]), vec![Address::ZERO]);
        registry.remove_transformers(GOVERNOR, vec![dependent]).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregistration_overwrites_the_mapping() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let dependent = Address::repeat_byte(0x30);
        let first = Address::repeat_byte(0x40);
        let second = Address::repeat_byte(0x41);

        registry
            .register_transformers(
                GOVERNOR,
                vec![registration(CandidateTransformer::admissible(first), vec![dependent])],
            )
            .unwrap();
        registry
            .register_transformers(
                GOVERNOR,
                vec![registration(CandidateTransformer::admissible(second), vec![dependent])],
            )
            .unwrap();

        assert_eq!(registry.transformers(&[dependent]), vec![second]);
        assert_eq!(registry.registered_count(), 1);
    }

    #[test]
    fn test_unregistered_dependent_resolves_to_nothing() {
        let (ledger, _, vault) = vault_world();
        let registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        assert_eq!(
            registry.get_underlying(&user_ctx(&ledger), vault),
            Err(TransformerError::NoTransformerRegistered { dependent: vault })
        );
        assert_eq!(
            registry.transform_all_to_underlying(&user_ctx(&ledger), vault, RECIPIENT, &[], DEADLINE),
            Err(TransformerError::NoTransformerRegistered { dependent: vault })
        );
    }

    #[test]
    fn test_quote_calls_resolve_and_forward() {
        let (ledger, asset, vault) = vault_world();
        let registry = vault_registry(vault);
        let ctx = user_ctx(&ledger);

        assert_eq!(registry.get_underlying(&ctx, vault), Ok(vec![asset]));
        assert_eq!(
            registry.calculate_transform_to_underlying(&ctx, vault, u(100_000)),
            Ok(vec![UnderlyingAmount::new(asset, u(12_345_678))])
        );
        assert_eq!(
            registry.calculate_needed_to_transform_to_dependent(&ctx, vault, u(8)),
            Ok(vec![UnderlyingAmount::new(asset, u(988))])
        );
    }

    #[test]
    fn test_pass_through_spends_allowances_granted_to_the_registry() {
        let (ledger, asset, vault) = vault_world();
        let registry = vault_registry(vault);
        let ctx = user_ctx(&ledger);
        ledger.mint_erc20(asset, USER, u(1000));

        // The user approves the registry, not the transformer behind it.
        ledger.erc20(asset).unwrap().approve(USER, REGISTRY, u(1000)).unwrap();
        let received = registry
            .transform_to_dependent(
                &ctx,
                vault,
                &[UnderlyingAmount::new(asset, u(1000))],
                RECIPIENT,
                u(8),
                DEADLINE,
            )
            .unwrap();

        assert_eq!(received, u(8));
        assert_eq!(ledger.erc20(vault).unwrap().balance_of(RECIPIENT), u(8));
        assert_eq!(ledger.erc20(asset).unwrap().allowance(USER, REGISTRY), U256::ZERO);
    }

    #[test]
    fn test_transform_all_to_underlying_converts_the_full_balance() {
        let (ledger, asset, vault) = vault_world();
        let registry = vault_registry(vault);
        let ctx = user_ctx(&ledger);

        ledger.erc20(vault).unwrap().approve(USER, REGISTRY, u(100_000)).unwrap();
        let received = registry
            .transform_all_to_underlying(
                &ctx,
                vault,
                RECIPIENT,
                &[UnderlyingAmount::new(asset, u(12_345_678))],
                DEADLINE,
            )
            .unwrap();

        assert_eq!(received, vec![UnderlyingAmount::new(asset, u(12_345_678))]);
        assert_eq!(ledger.erc20(vault).unwrap().balance_of(USER), U256::ZERO);
        assert_eq!(ledger.erc20(asset).unwrap().balance_of(RECIPIENT), u(12_345_678));
    }

    #[test]
    fn test_transform_all_to_dependent_reads_the_caller_balance() {
        let (ledger, asset, vault) = vault_world();
        let registry = vault_registry(vault);
        let ctx = user_ctx(&ledger);
        ledger.mint_erc20(asset, USER, u(1000));
        ledger.erc20(asset).unwrap().approve(USER, REGISTRY, u(1000)).unwrap();

        let received = registry
            .transform_all_to_dependent(&ctx, vault, RECIPIENT, u(8), DEADLINE)
            .unwrap();

        assert_eq!(received, u(8));
        assert_eq!(ledger.erc20(asset).unwrap().balance_of(USER), U256::ZERO);
        assert_eq!(ledger.erc20(vault).unwrap().balance_of(RECIPIENT), u(8));
    }

    #[test]
    fn test_transform_all_to_dependent_takes_the_attached_value_for_native() {
        let mut ledger = InMemoryLedger::new();
        let wrapped = Address::repeat_byte(0xe0);
        ledger.deploy_wrapped_native(wrapped);
        ledger.mint_native(USER, u(1000));
        ledger.set_timestamp(1000);
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        registry
            .register_transformers(
                GOVERNOR,
                vec![TransformerRegistration::new(
                    Arc::new(ProtocolTokenWrapperTransformer::new(WRAPPER_TRANSFORMER)),
                    vec![wrapped],
                )],
            )
            .unwrap();
        let ctx = user_ctx(&ledger).with_value(u(400));

        let received = registry
            .transform_all_to_dependent(&ctx, wrapped, RECIPIENT, u(400), DEADLINE)
            .unwrap();

        assert_eq!(received, u(400));
        assert_eq!(ledger.erc20(wrapped).unwrap().balance_of(RECIPIENT), u(400));
        assert_eq!(ledger.native_balance(USER), u(600));
    }

    #[test]
    fn test_governor_handoff_is_two_step() {
        let mut registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        let next = Address::repeat_byte(0x0b);

        assert_eq!(
            registry.set_pending_governor(USER, next),
            Err(TransformerError::OnlyGovernor)
        );
        registry.set_pending_governor(GOVERNOR, next).unwrap();
        assert_eq!(registry.governor(), GOVERNOR);
        assert!(registry.is_pending_governor(next));

        assert_eq!(
            registry.accept_pending_governor(GOVERNOR),
            Err(TransformerError::OnlyPendingGovernor)
        );
        registry.accept_pending_governor(next).unwrap();
        assert_eq!(registry.governor(), next);
        assert_eq!(registry.pending_governor(), None);

        // The old governor no longer passes the gate.
        assert_eq!(
            registry.remove_transformers(GOVERNOR, vec![]),
            Err(TransformerError::OnlyGovernor)
        );
        registry.remove_transformers(next, vec![]).unwrap();
    }

    #[test]
    fn test_dust_is_reported_and_swept_by_the_governor() {
        let (ledger, asset, vault) = vault_world();
        let registry = vault_registry(vault);
        ledger.mint_erc20(asset, REGISTRY, u(55));
        ledger.mint_native(REGISTRY, u(10));

        assert_eq!(
            registry.dust_balances(&ledger, &[asset, PROTOCOL_TOKEN]),
            Ok(vec![
                TokenBalance { token: asset, balance: u(55) },
                TokenBalance { token: PROTOCOL_TOKEN, balance: u(10) },
            ])
        );

        assert_eq!(
            registry.send_dust(&user_ctx(&ledger), asset, u(55), RECIPIENT),
            Err(TransformerError::OnlyGovernor)
        );
        let governor_ctx = TransformContext::new(&ledger, GOVERNOR, REGISTRY);
        assert_eq!(
            registry.send_dust(&governor_ctx, asset, u(55), Address::ZERO),
            Err(TransformerError::DustRecipientIsZeroAddress)
        );

        registry.send_dust(&governor_ctx, asset, u(55), RECIPIENT).unwrap();
        registry.send_dust(&governor_ctx, PROTOCOL_TOKEN, u(10), RECIPIENT).unwrap();
        assert_eq!(ledger.erc20(asset).unwrap().balance_of(RECIPIENT), u(55));
        assert_eq!(ledger.native_balance(RECIPIENT), u(10));
    }

    #[test]
    fn test_registry_capabilities_include_dust_collection() {
        let registry = TransformerRegistry::new(REGISTRY, GOVERNOR).unwrap();
        assert!(registry.supports_capability(CapabilityId::probe()));
        assert!(registry.supports_capability(CapabilityId::transform()));
        assert!(registry.supports_capability(CapabilityId::collectable_dust()));
        assert!(!registry.supports_capability(CapabilityId::INVALID));
    }
}
