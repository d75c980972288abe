//! Call contracts of the external asset contracts the protocol converses with.
//!
//! The protocol never reimplements asset math. Every conversion estimate and
//! execution delegates to these interfaces, and the ledger host resolves an
//! asset id to an object implementing the right one. Acting parties are
//! explicit parameters (`caller`, `from`, `owner`) because calls here are
//! plain function calls, not messages with an ambient sender.

use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("no contract deployed at {0}")]
    UnknownContract(Address),

    #[error("contract at {0} does not expose the requested interface")]
    UnsupportedInterface(Address),

    #[error("token {token}: {holder} holds {balance}, needs {needed}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        balance: U256,
        needed: U256,
    },

    #[error("token {token}: allowance {owner} -> {spender} is {allowance}, needs {needed}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        allowance: U256,
        needed: U256,
    },

    #[error("native balance of {account} is {balance}, needs {needed}")]
    InsufficientNative {
        account: Address,
        balance: U256,
        needed: U256,
    },

    #[error("token amount overflow")]
    Overflow,
}

/// Minimal fungible-token surface.
pub trait Erc20 {
    fn balance_of(&self, account: Address) -> U256;

    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Move `amount` from `from` to `to`. `from` is the acting party.
    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError>;

    /// Move `amount` from `owner` to `to`, spending `owner -> spender` allowance.
    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Set the `owner -> spender` allowance to exactly `amount`.
    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), TokenError>;
}

/// Tokenized vault (EIP-4626 shape): shares are the vault's own fungible
/// token, backed by a single underlying asset.
///
/// Previews are the vault's authoritative conversion quotes. `preview_mint`
/// may quote conservatively (no fewer assets than the actual mint will take);
/// callers reconcile against actuals.
pub trait Erc4626Vault: Erc20 {
    /// The single underlying asset backing the vault.
    fn asset(&self) -> Address;

    /// Shares credited for depositing `assets`.
    fn preview_deposit(&self, assets: U256) -> U256;

    /// Assets required to mint exactly `shares`.
    fn preview_mint(&self, shares: U256) -> U256;

    /// Shares burned to withdraw exactly `assets`.
    fn preview_withdraw(&self, assets: U256) -> U256;

    /// Assets returned for redeeming `shares`.
    fn preview_redeem(&self, shares: U256) -> U256;

    /// Pull `assets` from `caller`, credit shares to `receiver`.
    /// Returns shares minted.
    fn deposit(&self, caller: Address, assets: U256, receiver: Address)
        -> Result<U256, TokenError>;

    /// Pull however many assets minting exactly `shares` takes from `caller`,
    /// credit `shares` to `receiver`. Returns assets taken.
    fn mint(&self, caller: Address, shares: U256, receiver: Address) -> Result<U256, TokenError>;

    /// Burn however many of `owner`'s shares withdrawing exactly `assets`
    /// takes, send the assets to `receiver`. A `caller` other than `owner`
    /// spends share allowance. Returns shares burned.
    fn withdraw(
        &self,
        caller: Address,
        assets: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<U256, TokenError>;

    /// Burn exactly `shares` of `owner`'s shares, send the redeemed assets to
    /// `receiver`. A `caller` other than `owner` spends share allowance.
    /// Returns assets sent.
    fn redeem(
        &self,
        caller: Address,
        shares: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<U256, TokenError>;
}

/// Wrapped native token (WETH9 shape): 1:1 wrapper around native value.
pub trait WrappedNative: Erc20 {
    /// Wrap `amount` of `caller`'s native value into tokens held by `caller`.
    fn deposit(&self, caller: Address, amount: U256) -> Result<(), TokenError>;

    /// Burn `amount` of `caller`'s tokens and credit native value back.
    fn withdraw(&self, caller: Address, amount: U256) -> Result<(), TokenError>;
}

/// Rebasing staked token: balances are pooled value backed by an internal
/// share ledger, so they move when the pool rebases.
pub trait StakedToken: Erc20 {
    /// Pooled value corresponding to `shares`.
    fn get_pooled_eth_by_shares(&self, shares: U256) -> U256;

    /// Shares corresponding to `pooled` value. Floor-rounded, which is why
    /// needed-amount math on top of this must round up.
    fn get_shares_by_pooled_eth(&self, pooled: U256) -> U256;

    fn get_total_shares(&self) -> U256;

    /// Total pooled value (the rebasing token's total supply).
    fn total_supply(&self) -> U256;
}

/// Non-rebasing wrapper over a [`StakedToken`]: one wrapper token per share.
pub trait WrappedStakedToken: Erc20 {
    /// The rebasing token this wraps.
    fn staked_token(&self) -> Address;

    /// Pull `pooled_amount` of the staked token from `caller` (spending
    /// allowance to this wrapper) and credit wrapper tokens. Returns the
    /// wrapper tokens minted.
    fn wrap(&self, caller: Address, pooled_amount: U256) -> Result<U256, TokenError>;

    /// Burn `amount` of `caller`'s wrapper tokens and send the staked token
    /// back. Returns the pooled amount sent.
    fn unwrap(&self, caller: Address, amount: U256) -> Result<U256, TokenError>;
}
