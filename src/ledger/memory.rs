//! Deterministic in-memory ledger host.
//!
//! Contracts share one [`LedgerState`] behind `Rc<RefCell<…>>`, which is what
//! lets a vault move its asset token or a wrapper pull an allowance without
//! object cycles. `execute` brackets a call in a snapshot/restore frame so a
//! failed call commits nothing, matching on-ledger revert semantics.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use alloy_primitives::{Address, U256};

use crate::tokens::{
    Erc20, Erc4626Vault, StakedToken, TokenError, WrappedNative, WrappedStakedToken,
};

use super::tokens::{SimErc20, SimStakedToken, SimVault, SimWrappedNative, SimWrappedStaked};
use super::Ledger;

/// Per-token balances, allowances, and supply.
///
/// For the rebasing staked token the book is denominated in shares, not
/// pooled units; its contract converts at the boundary.
#[derive(Debug, Default, Clone)]
pub(crate) struct TokenBook {
    pub(crate) balances: HashMap<Address, U256>,
    pub(crate) allowances: HashMap<(Address, Address), U256>,
    pub(crate) total_supply: U256,
}

/// The whole mutable world: native balances, token books, rebasing totals,
/// and the clock. Cloning it is what a snapshot is.
#[derive(Debug, Default, Clone)]
pub(crate) struct LedgerState {
    pub(crate) native: HashMap<Address, U256>,
    pub(crate) books: HashMap<Address, TokenBook>,
    pub(crate) staked_pooled: HashMap<Address, U256>,
    pub(crate) timestamp: u64,
}

impl LedgerState {
    fn book_mut(&mut self, token: Address) -> &mut TokenBook {
        self.books.entry(token).or_default()
    }

    pub(crate) fn erc20_balance(&self, token: Address, holder: Address) -> U256 {
        self.books
            .get(&token)
            .and_then(|book| book.balances.get(&holder))
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn erc20_total_supply(&self, token: Address) -> U256 {
        self.books
            .get(&token)
            .map(|book| book.total_supply)
            .unwrap_or_default()
    }

    pub(crate) fn erc20_allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.books
            .get(&token)
            .and_then(|book| book.allowances.get(&(owner, spender)))
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn erc20_transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let balance = self.erc20_balance(token, from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                token,
                holder: from,
                balance,
                needed: amount,
            });
        }
        let book = self.book_mut(token);
        book.balances.insert(from, balance - amount);
        let to_balance = book.balances.get(&to).copied().unwrap_or_default();
        let to_balance = to_balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        book.balances.insert(to, to_balance);
        Ok(())
    }

    pub(crate) fn erc20_mint(
        &mut self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let book = self.book_mut(token);
        let balance = book.balances.get(&to).copied().unwrap_or_default();
        let balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        let supply = book.total_supply.checked_add(amount).ok_or(TokenError::Overflow)?;
        book.balances.insert(to, balance);
        book.total_supply = supply;
        Ok(())
    }

    pub(crate) fn erc20_burn(
        &mut self,
        token: Address,
        from: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let balance = self.erc20_balance(token, from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                token,
                holder: from,
                balance,
                needed: amount,
            });
        }
        let book = self.book_mut(token);
        book.balances.insert(from, balance - amount);
        book.total_supply = book.total_supply - amount;
        Ok(())
    }

    pub(crate) fn erc20_set_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) {
        self.book_mut(token).allowances.insert((owner, spender), amount);
    }

    pub(crate) fn erc20_spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let allowance = self.erc20_allowance(token, owner, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                token,
                owner,
                spender,
                allowance,
                needed: amount,
            });
        }
        self.book_mut(token)
            .allowances
            .insert((owner, spender), allowance - amount);
        Ok(())
    }

    pub(crate) fn native_balance(&self, account: Address) -> U256 {
        self.native.get(&account).copied().unwrap_or_default()
    }

    pub(crate) fn native_credit(&mut self, to: Address, amount: U256) -> Result<(), TokenError> {
        let balance = self.native_balance(to);
        let balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        self.native.insert(to, balance);
        Ok(())
    }

    pub(crate) fn native_debit(&mut self, from: Address, amount: U256) -> Result<(), TokenError> {
        let balance = self.native_balance(from);
        if balance < amount {
            return Err(TokenError::InsufficientNative {
                account: from,
                balance,
                needed: amount,
            });
        }
        self.native.insert(from, balance - amount);
        Ok(())
    }
}

pub(crate) enum Contract {
    Erc20(SimErc20),
    Vault(SimVault),
    WrappedNative(SimWrappedNative),
    Staked(SimStakedToken),
    WrappedStaked(SimWrappedStaked),
}

/// Opaque copy of the whole ledger state.
pub struct LedgerSnapshot(LedgerState);

/// The reference [`Ledger`] host: deploy simulated contracts, fund accounts,
/// control the clock and rebasing totals, and run calls in atomic frames.
pub struct InMemoryLedger {
    state: Rc<RefCell<LedgerState>>,
    contracts: HashMap<Address, Contract>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(LedgerState::default())),
            contracts: HashMap::new(),
        }
    }

    pub fn set_timestamp(&self, timestamp: u64) {
        self.state.borrow_mut().timestamp = timestamp;
    }

    pub fn advance_time(&self, seconds: u64) {
        self.state.borrow_mut().timestamp += seconds;
    }

    pub fn deploy_erc20(&mut self, address: Address) {
        self.contracts
            .insert(address, Contract::Erc20(SimErc20::new(address, self.state.clone())));
    }

    pub fn deploy_vault(&mut self, address: Address, asset: Address) {
        self.deploy_vault_with_mint_margin(address, asset, U256::ZERO);
    }

    /// Vault whose `preview_mint` over-quotes by `margin` while the actual
    /// mint charges the exact amount. The vault standard permits
    /// conservative mint quotes; this is how callers' refund paths get
    /// exercised.
    pub fn deploy_vault_with_mint_margin(&mut self, address: Address, asset: Address, margin: U256) {
        self.contracts.insert(
            address,
            Contract::Vault(SimVault::new(address, asset, margin, self.state.clone())),
        );
    }

    pub fn deploy_wrapped_native(&mut self, address: Address) {
        self.contracts.insert(
            address,
            Contract::WrappedNative(SimWrappedNative::new(address, self.state.clone())),
        );
    }

    /// Deploy a rebasing staked token with `shares` total shares held
    /// entirely by `holder` against `pooled` total pooled value.
    pub fn deploy_staked(&mut self, address: Address, holder: Address, shares: U256, pooled: U256) {
        {
            let mut state = self.state.borrow_mut();
            let book = state.books.entry(address).or_default();
            book.balances.insert(holder, shares);
            book.total_supply = shares;
            state.staked_pooled.insert(address, pooled);
        }
        self.contracts.insert(
            address,
            Contract::Staked(SimStakedToken::new(address, self.state.clone())),
        );
    }

    pub fn deploy_wrapped_staked(&mut self, address: Address, staked: Address) {
        self.contracts.insert(
            address,
            Contract::WrappedStaked(SimWrappedStaked::new(address, staked, self.state.clone())),
        );
    }

    /// Credit `to` with `amount` of `token`, growing supply. Setup helper.
    pub fn mint_erc20(&self, token: Address, to: Address, amount: U256) {
        let mut state = self.state.borrow_mut();
        let book = state.book_mut(token);
        let balance = book.balances.get(&to).copied().unwrap_or_default();
        book.balances.insert(to, balance.saturating_add(amount));
        book.total_supply = book.total_supply.saturating_add(amount);
    }

    /// Credit `to` with native value. Setup helper.
    pub fn mint_native(&self, to: Address, amount: U256) {
        let mut state = self.state.borrow_mut();
        let balance = state.native_balance(to);
        state.native.insert(to, balance.saturating_add(amount));
    }

    /// Rebase: reprice the staked token's pooled total without touching
    /// shares.
    pub fn set_total_pooled(&self, staked: Address, pooled: U256) {
        self.state.borrow_mut().staked_pooled.insert(staked, pooled);
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot(self.state.borrow().clone())
    }

    pub fn restore(&self, snapshot: LedgerSnapshot) {
        *self.state.borrow_mut() = snapshot.0;
    }

    /// Run `f` as one atomic call frame: on error every state change it made
    /// is rolled back.
    pub fn execute<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let snapshot = self.snapshot();
        let result = f();
        if result.is_err() {
            self.restore(snapshot);
        }
        result
    }

    fn contract(&self, address: Address) -> Result<&Contract, TokenError> {
        self.contracts
            .get(&address)
            .ok_or(TokenError::UnknownContract(address))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for InMemoryLedger {
    fn erc20(&self, token: Address) -> Result<&dyn Erc20, TokenError> {
        let erc20: &dyn Erc20 = match self.contract(token)? {
            Contract::Erc20(t) => t,
            Contract::Vault(t) => t,
            Contract::WrappedNative(t) => t,
            Contract::Staked(t) => t,
            Contract::WrappedStaked(t) => t,
        };
        Ok(erc20)
    }

    fn erc4626(&self, vault: Address) -> Result<&dyn Erc4626Vault, TokenError> {
        match self.contract(vault)? {
            Contract::Vault(v) => Ok(v),
            _ => Err(TokenError::UnsupportedInterface(vault)),
        }
    }

    fn wrapped_native(&self, token: Address) -> Result<&dyn WrappedNative, TokenError> {
        match self.contract(token)? {
            Contract::WrappedNative(t) => Ok(t),
            _ => Err(TokenError::UnsupportedInterface(token)),
        }
    }

    fn staked_token(&self, token: Address) -> Result<&dyn StakedToken, TokenError> {
        match self.contract(token)? {
            Contract::Staked(t) => Ok(t),
            _ => Err(TokenError::UnsupportedInterface(token)),
        }
    }

    fn wrapped_staked(&self, token: Address) -> Result<&dyn WrappedStakedToken, TokenError> {
        match self.contract(token)? {
            Contract::WrappedStaked(t) => Ok(t),
            _ => Err(TokenError::UnsupportedInterface(token)),
        }
    }

    fn native_balance(&self, account: Address) -> U256 {
        self.state.borrow().native_balance(account)
    }

    fn transfer_native(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let mut state = self.state.borrow_mut();
        state.native_debit(from, amount)?;
        state.native_credit(to, amount)
    }

    fn timestamp(&self) -> u64 {
        self.state.borrow().timestamp
    }
}
