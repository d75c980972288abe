//! Per-call execution context.

use alloy_primitives::{Address, U256};

use crate::ledger::Ledger;
use crate::tokens::{
    Erc20, Erc4626Vault, StakedToken, TokenError, WrappedNative, WrappedStakedToken,
};

/// Everything a single protocol call executes against: who is calling, how
/// much native value they attached, which identity the executing code runs
/// as, and the ledger it runs on.
///
/// `self_address` is the account conversions are routed through before being
/// forwarded to the recipient. Calling a transformer directly uses the
/// transformer's own identity; the registry forwards contexts unchanged, so
/// delegated conversions run under the registry's identity and spend
/// allowances granted to the registry.
pub struct TransformContext<'a> {
    pub caller: Address,
    pub value: U256,
    pub self_address: Address,
    ledger: &'a dyn Ledger,
}

impl<'a> TransformContext<'a> {
    pub fn new(ledger: &'a dyn Ledger, caller: Address, self_address: Address) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            self_address,
            ledger,
        }
    }

    /// Attach native value to the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger
    }

    pub fn timestamp(&self) -> u64 {
        self.ledger.timestamp()
    }

    // Typed resolution shorthands.

    pub fn erc20(&self, token: Address) -> Result<&dyn Erc20, TokenError> {
        self.ledger.erc20(token)
    }

    pub fn erc4626(&self, vault: Address) -> Result<&dyn Erc4626Vault, TokenError> {
        self.ledger.erc4626(vault)
    }

    pub fn wrapped_native(&self, token: Address) -> Result<&dyn WrappedNative, TokenError> {
        self.ledger.wrapped_native(token)
    }

    pub fn staked_token(&self, token: Address) -> Result<&dyn StakedToken, TokenError> {
        self.ledger.staked_token(token)
    }

    pub fn wrapped_staked(&self, token: Address) -> Result<&dyn WrappedStakedToken, TokenError> {
        self.ledger.wrapped_staked(token)
    }

    pub fn native_balance(&self, account: Address) -> U256 {
        self.ledger.native_balance(account)
    }

    pub fn transfer_native(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.ledger.transfer_native(from, to, amount)
    }
}
