//! Simulated asset contracts backing the in-memory ledger.
//!
//! Each contract is a thin handle over the shared [`LedgerState`]: plain
//! fungible tokens, a tokenized vault with floor/ceiling quote rounding, a
//! 1:1 wrapped-native token, a rebasing staked token whose book is
//! share-denominated, and the non-rebasing wrapper over it.

use std::cell::RefCell;
use std::rc::Rc;

use alloy_primitives::{Address, U256};

use crate::tokens::{
    Erc20, Erc4626Vault, StakedToken, TokenError, WrappedNative, WrappedStakedToken,
};

use super::memory::LedgerState;

fn mul_div_floor(a: U256, b: U256, c: U256) -> U256 {
    a * b / c
}

fn mul_div_ceil(a: U256, b: U256, c: U256) -> U256 {
    let product = a * b;
    let quotient = product / c;
    if (product % c).is_zero() {
        quotient
    } else {
        quotient + U256::from(1u8)
    }
}

/// Shares worth `pooled` units of the staked token at its current rate.
/// Floor-rounded, as the reference staking pools round.
fn staked_shares_by_pooled(state: &LedgerState, staked: Address, pooled: U256) -> U256 {
    let total_pooled = state.staked_pooled.get(&staked).copied().unwrap_or_default();
    if total_pooled.is_zero() {
        return U256::ZERO;
    }
    mul_div_floor(pooled, state.erc20_total_supply(staked), total_pooled)
}

/// Pooled value of `shares` of the staked token at its current rate.
fn staked_pooled_by_shares(state: &LedgerState, staked: Address, shares: U256) -> U256 {
    let total_shares = state.erc20_total_supply(staked);
    if total_shares.is_zero() {
        return U256::ZERO;
    }
    let total_pooled = state.staked_pooled.get(&staked).copied().unwrap_or_default();
    mul_div_floor(shares, total_pooled, total_shares)
}

/// Plain fungible token.
pub struct SimErc20 {
    address: Address,
    state: Rc<RefCell<LedgerState>>,
}

impl SimErc20 {
    pub(crate) fn new(address: Address, state: Rc<RefCell<LedgerState>>) -> Self {
        Self { address, state }
    }
}

impl Erc20 for SimErc20 {
    fn balance_of(&self, account: Address) -> U256 {
        self.state.borrow().erc20_balance(self.address, account)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state.borrow().erc20_allowance(self.address, owner, spender)
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_transfer(self.address, from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.erc20_spend_allowance(self.address, owner, spender, amount)?;
        state.erc20_transfer(self.address, owner, to, amount)
    }

    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_set_allowance(self.address, owner, spender, amount);
        Ok(())
    }
}

/// Tokenized vault over a single asset. Quotes follow the standard's
/// rounding: floor on deposit/redeem, ceiling on mint/withdraw. Total assets
/// is the vault's live asset balance, so donations move the share price.
pub struct SimVault {
    address: Address,
    asset: Address,
    mint_margin: U256,
    state: Rc<RefCell<LedgerState>>,
}

impl SimVault {
    pub(crate) fn new(
        address: Address,
        asset: Address,
        mint_margin: U256,
        state: Rc<RefCell<LedgerState>>,
    ) -> Self {
        Self { address, asset, mint_margin, state }
    }

    fn total_assets(&self) -> U256 {
        self.state.borrow().erc20_balance(self.asset, self.address)
    }

    fn supply(&self) -> U256 {
        self.state.borrow().erc20_total_supply(self.address)
    }

    /// Assets the actual mint will charge for `shares`. `preview_mint` adds
    /// the configured margin on top of this.
    fn exact_mint_cost(&self, shares: U256) -> U256 {
        let supply = self.supply();
        if supply.is_zero() {
            return shares;
        }
        mul_div_ceil(shares, self.total_assets(), supply)
    }
}

impl Erc20 for SimVault {
    fn balance_of(&self, account: Address) -> U256 {
        self.state.borrow().erc20_balance(self.address, account)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state.borrow().erc20_allowance(self.address, owner, spender)
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_transfer(self.address, from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.erc20_spend_allowance(self.address, owner, spender, amount)?;
        state.erc20_transfer(self.address, owner, to, amount)
    }

    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_set_allowance(self.address, owner, spender, amount);
        Ok(())
    }
}

impl Erc4626Vault for SimVault {
    fn asset(&self) -> Address {
        self.asset
    }

    fn preview_deposit(&self, assets: U256) -> U256 {
        let supply = self.supply();
        let total_assets = self.total_assets();
        if supply.is_zero() || total_assets.is_zero() {
            return assets;
        }
        mul_div_floor(assets, supply, total_assets)
    }

    fn preview_mint(&self, shares: U256) -> U256 {
        self.exact_mint_cost(shares) + self.mint_margin
    }

    fn preview_withdraw(&self, assets: U256) -> U256 {
        let supply = self.supply();
        let total_assets = self.total_assets();
        if supply.is_zero() || total_assets.is_zero() {
            return assets;
        }
        mul_div_ceil(assets, supply, total_assets)
    }

    fn preview_redeem(&self, shares: U256) -> U256 {
        let supply = self.supply();
        if supply.is_zero() {
            return shares;
        }
        mul_div_floor(shares, self.total_assets(), supply)
    }

    fn deposit(
        &self,
        caller: Address,
        assets: U256,
        receiver: Address,
    ) -> Result<U256, TokenError> {
        let shares = self.preview_deposit(assets);
        let mut state = self.state.borrow_mut();
        state.erc20_spend_allowance(self.asset, caller, self.address, assets)?;
        state.erc20_transfer(self.asset, caller, self.address, assets)?;
        state.erc20_mint(self.address, receiver, shares)?;
        Ok(shares)
    }

    fn mint(&self, caller: Address, shares: U256, receiver: Address) -> Result<U256, TokenError> {
        let assets = self.exact_mint_cost(shares);
        let mut state = self.state.borrow_mut();
        state.erc20_spend_allowance(self.asset, caller, self.address, assets)?;
        state.erc20_transfer(self.asset, caller, self.address, assets)?;
        state.erc20_mint(self.address, receiver, shares)?;
        Ok(assets)
    }

    fn withdraw(
        &self,
        caller: Address,
        assets: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<U256, TokenError> {
        let shares = self.preview_withdraw(assets);
        let mut state = self.state.borrow_mut();
        if caller != owner {
            state.erc20_spend_allowance(self.address, owner, caller, shares)?;
        }
        state.erc20_burn(self.address, owner, shares)?;
        state.erc20_transfer(self.asset, self.address, receiver, assets)?;
        Ok(shares)
    }

    fn redeem(
        &self,
        caller: Address,
        shares: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<U256, TokenError> {
        let assets = self.preview_redeem(shares);
        let mut state = self.state.borrow_mut();
        if caller != owner {
            state.erc20_spend_allowance(self.address, owner, caller, shares)?;
        }
        state.erc20_burn(self.address, owner, shares)?;
        state.erc20_transfer(self.asset, self.address, receiver, assets)?;
        Ok(assets)
    }
}

/// 1:1 wrapper over native value. Wrapped value sits as native balance on
/// the token's own address until withdrawn.
pub struct SimWrappedNative {
    address: Address,
    state: Rc<RefCell<LedgerState>>,
}

impl SimWrappedNative {
    pub(crate) fn new(address: Address, state: Rc<RefCell<LedgerState>>) -> Self {
        Self { address, state }
    }
}

impl Erc20 for SimWrappedNative {
    fn balance_of(&self, account: Address) -> U256 {
        self.state.borrow().erc20_balance(self.address, account)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state.borrow().erc20_allowance(self.address, owner, spender)
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_transfer(self.address, from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.erc20_spend_allowance(self.address, owner, spender, amount)?;
        state.erc20_transfer(self.address, owner, to, amount)
    }

    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_set_allowance(self.address, owner, spender, amount);
        Ok(())
    }
}

impl WrappedNative for SimWrappedNative {
    fn deposit(&self, caller: Address, amount: U256) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.native_debit(caller, amount)?;
        state.native_credit(self.address, amount)?;
        state.erc20_mint(self.address, caller, amount)
    }

    fn withdraw(&self, caller: Address, amount: U256) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.erc20_burn(self.address, caller, amount)?;
        state.native_debit(self.address, amount)?;
        state.native_credit(caller, amount)
    }
}

/// Rebasing staked token. The book holds shares; the fungible surface is
/// pooled-denominated, so a transfer converts its amount to shares at the
/// current rate and moves those. Balance checks therefore happen at share
/// precision, which is what lets a holder forward a just-received balance
/// even when its pooled display rounds down.
pub struct SimStakedToken {
    address: Address,
    state: Rc<RefCell<LedgerState>>,
}

impl SimStakedToken {
    pub(crate) fn new(address: Address, state: Rc<RefCell<LedgerState>>) -> Self {
        Self { address, state }
    }
}

impl Erc20 for SimStakedToken {
    fn balance_of(&self, account: Address) -> U256 {
        let state = self.state.borrow();
        let shares = state.erc20_balance(self.address, account);
        staked_pooled_by_shares(&state, self.address, shares)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state.borrow().erc20_allowance(self.address, owner, spender)
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let shares = {
            let state = self.state.borrow();
            staked_shares_by_pooled(&state, self.address, amount)
        };
        self.state.borrow_mut().erc20_transfer(self.address, from, to, shares)
    }

    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let shares = {
            let state = self.state.borrow();
            staked_shares_by_pooled(&state, self.address, amount)
        };
        let mut state = self.state.borrow_mut();
        state.erc20_spend_allowance(self.address, owner, spender, amount)?;
        state.erc20_transfer(self.address, owner, to, shares)
    }

    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_set_allowance(self.address, owner, spender, amount);
        Ok(())
    }
}

impl StakedToken for SimStakedToken {
    fn get_pooled_eth_by_shares(&self, shares: U256) -> U256 {
        staked_pooled_by_shares(&self.state.borrow(), self.address, shares)
    }

    fn get_shares_by_pooled_eth(&self, pooled: U256) -> U256 {
        staked_shares_by_pooled(&self.state.borrow(), self.address, pooled)
    }

    fn get_total_shares(&self) -> U256 {
        self.state.borrow().erc20_total_supply(self.address)
    }

    fn total_supply(&self) -> U256 {
        self.state
            .borrow()
            .staked_pooled
            .get(&self.address)
            .copied()
            .unwrap_or_default()
    }
}

/// Non-rebasing wrapper over the staked token: one wrapper token per staked
/// share.
pub struct SimWrappedStaked {
    address: Address,
    staked: Address,
    state: Rc<RefCell<LedgerState>>,
}

impl SimWrappedStaked {
    pub(crate) fn new(address: Address, staked: Address, state: Rc<RefCell<LedgerState>>) -> Self {
        Self { address, staked, state }
    }
}

impl Erc20 for SimWrappedStaked {
    fn balance_of(&self, account: Address) -> U256 {
        self.state.borrow().erc20_balance(self.address, account)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state.borrow().erc20_allowance(self.address, owner, spender)
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_transfer(self.address, from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.erc20_spend_allowance(self.address, owner, spender, amount)?;
        state.erc20_transfer(self.address, owner, to, amount)
    }

    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), TokenError> {
        self.state.borrow_mut().erc20_set_allowance(self.address, owner, spender, amount);
        Ok(())
    }
}

impl WrappedStakedToken for SimWrappedStaked {
    fn staked_token(&self) -> Address {
        self.staked
    }

    fn wrap(&self, caller: Address, pooled_amount: U256) -> Result<U256, TokenError> {
        let mut state = self.state.borrow_mut();
        let shares = staked_shares_by_pooled(&state, self.staked, pooled_amount);
        state.erc20_spend_allowance(self.staked, caller, self.address, pooled_amount)?;
        state.erc20_transfer(self.staked, caller, self.address, shares)?;
        state.erc20_mint(self.address, caller, shares)?;
        Ok(shares)
    }

    fn unwrap(&self, caller: Address, amount: U256) -> Result<U256, TokenError> {
        let mut state = self.state.borrow_mut();
        state.erc20_burn(self.address, caller, amount)?;
        let pooled = staked_pooled_by_shares(&state, self.staked, amount);
        state.erc20_transfer(self.staked, self.address, caller, amount)?;
        Ok(pooled)
    }
}
