//! Ledger host abstraction.
//!
//! A ledger resolves asset ids to the contract objects deployed at them,
//! holds native value balances, and supplies the clock that deadlines are
//! checked against. The protocol only ever talks to this trait; `memory`
//! provides the deterministic in-process implementation used by tests and
//! the scenario driver.

pub mod memory;
pub mod tokens;

use alloy_primitives::{Address, U256};

use crate::tokens::{
    Erc20, Erc4626Vault, StakedToken, TokenError, WrappedNative, WrappedStakedToken,
};

pub use memory::{InMemoryLedger, LedgerSnapshot};
pub use tokens::{SimErc20, SimStakedToken, SimVault, SimWrappedNative, SimWrappedStaked};

/// Host environment for a single deterministic ledger.
///
/// Resolution is typed: asking for an interface a contract does not expose
/// fails with [`TokenError::UnsupportedInterface`], and an address with
/// nothing deployed fails with [`TokenError::UnknownContract`].
pub trait Ledger {
    fn erc20(&self, token: Address) -> Result<&dyn Erc20, TokenError>;

    fn erc4626(&self, vault: Address) -> Result<&dyn Erc4626Vault, TokenError>;

    fn wrapped_native(&self, token: Address) -> Result<&dyn WrappedNative, TokenError>;

    fn staked_token(&self, token: Address) -> Result<&dyn StakedToken, TokenError>;

    fn wrapped_staked(&self, token: Address) -> Result<&dyn WrappedStakedToken, TokenError>;

    /// Native value held by `account`.
    fn native_balance(&self, account: Address) -> U256;

    /// Move native value between accounts. `from` is the acting party and
    /// must cover `amount`.
    fn transfer_native(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError>;

    /// Current ledger time in seconds.
    fn timestamp(&self) -> u64;
}
