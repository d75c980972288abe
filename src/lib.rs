//! In-process protocol for transforming tokenized assets ("dependents") into
//! and out of the assets that back them ("underlying").
//!
//! This crate provides:
//! - A [`Transformer`](transformers::Transformer) contract shared by every
//!   dependent token, with quote, needed-amount, and execution operations
//! - Transformers for tokenized vaults, the wrapped native token, and
//!   wrappers over rebasing staked tokens
//! - A governed [`TransformerRegistry`](registry::TransformerRegistry) that
//!   routes calls by dependent and answers the same contract itself
//! - A deterministic in-memory [`Ledger`](ledger::Ledger) host with simulated
//!   asset contracts for driving and testing the protocol
//!
//! # Architecture
//!
//! ```text
//! Caller ──► TransformerRegistry ──► Transformer ──► asset contracts
//!                 │   (by dependent)     │  (vault / wrapped native / staked)
//!                 │                      │
//!                 └──────────────────────┴─► Ledger (balances, allowances,
//!                                             native value, clock)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use asset_transformers::{
//!     Erc4626Transformer, InMemoryLedger, TransformContext, Transformer,
//!     TransformerRegistration, TransformerRegistry, UnderlyingAmount,
//! };
//!
//! let mut ledger = InMemoryLedger::new();
//! ledger.deploy_erc20(asset);
//! ledger.deploy_vault(vault, asset);
//!
//! let mut registry = TransformerRegistry::new(registry_address, governor)?;
//! registry.register_transformers(
//!     governor,
//!     vec![TransformerRegistration::new(
//!         Arc::new(Erc4626Transformer::new(transformer_address)),
//!         vec![vault],
//!     )],
//! )?;
//!
//! let ctx = TransformContext::new(&ledger, caller, registry_address);
//! let received = registry.transform_to_underlying(
//!     &ctx,
//!     vault,
//!     shares,
//!     recipient,
//!     &[UnderlyingAmount::new(asset, min_out)],
//!     deadline,
//! )?;
//! ```

pub mod capability;
pub mod config;
pub mod context;
pub mod dust;
pub mod error;
pub mod governance;
pub mod ledger;
pub mod registry;
pub mod tokens;
pub mod transformers;
pub mod types;

// Re-exports for convenience
pub use capability::CapabilityId;
pub use context::TransformContext;
pub use dust::TokenBalance;
pub use error::TransformerError;
pub use governance::Governance;
pub use ledger::{InMemoryLedger, Ledger, LedgerSnapshot};
pub use registry::{TransformerRegistration, TransformerRegistry};
pub use tokens::TokenError;
pub use transformers::{
    Erc4626Transformer, ProtocolTokenWrapperTransformer, StakedTokenTransformer, Transformer,
};
pub use types::{UnderlyingAmount, PROTOCOL_TOKEN};
