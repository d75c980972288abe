//! Scenario configuration for the demo driver.
//!
//! A scenario names the deployed world (asset contracts, protocol addresses,
//! accounts) plus seed balances, so the driver can build the same ledger
//! every run.

use std::path::Path;

use alloy_primitives::Address;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    pub governor: Address,
    pub user: Address,
    pub recipient: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    pub registry: Address,
    pub vault_transformer: Address,
    pub wrapped_native_transformer: Address,
    pub staked_transformer: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    pub address: Address,
    pub asset: Address,
    pub seed_shares: u64,
    pub seed_assets: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WrappedNativeConfig {
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakedConfig {
    pub address: Address,
    pub wrapper: Address,
    pub seed_shares: u64,
    pub seed_pooled: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioConfigRaw {
    pub accounts: AccountsConfig,
    pub protocol: ProtocolConfig,
    pub vault: VaultConfig,
    pub wrapped_native: WrappedNativeConfig,
    pub staked: StakedConfig,
    pub start_timestamp: Option<u64>,
    pub deadline_margin: Option<u64>,
    pub user_funding: Option<u64>,
}

#[derive(Debug)]
pub struct ScenarioConfig {
    pub accounts: AccountsConfig,
    pub protocol: ProtocolConfig,
    pub vault: VaultConfig,
    pub wrapped_native: WrappedNativeConfig,
    pub staked: StakedConfig,
    pub start_timestamp: u64,
    /// Seconds added to the current timestamp when the driver builds a
    /// deadline.
    pub deadline_margin: u64,
    pub user_funding: u64,
}

pub fn resolve_scenario_config(raw: ScenarioConfigRaw) -> ScenarioConfig {
    ScenarioConfig {
        accounts: raw.accounts,
        protocol: raw.protocol,
        vault: raw.vault,
        wrapped_native: raw.wrapped_native,
        staked: raw.staked,
        start_timestamp: raw.start_timestamp.unwrap_or(1_700_000_000),
        deadline_margin: raw.deadline_margin.unwrap_or(600),
        user_funding: raw.user_funding.unwrap_or(1_000_000),
    }
}

impl ScenarioConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let raw: ScenarioConfigRaw = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        Ok(resolve_scenario_config(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_applies_defaults() {
        let raw: ScenarioConfigRaw = serde_json::from_str(
            r#"{
                "accounts": {
                    "governor": "0x0101010101010101010101010101010101010101",
                    "user": "0x0202020202020202020202020202020202020202",
                    "recipient": "0x0303030303030303030303030303030303030303"
                },
                "protocol": {
                    "registry": "0x1111111111111111111111111111111111111111",
                    "vault_transformer": "0x1212121212121212121212121212121212121212",
                    "wrapped_native_transformer": "0x1313131313131313131313131313131313131313",
                    "staked_transformer": "0x1414141414141414141414141414141414141414"
                },
                "vault": {
                    "address": "0x2121212121212121212121212121212121212121",
                    "asset": "0x2222222222222222222222222222222222222222",
                    "seed_shares": 100000,
                    "seed_assets": 12345678
                },
                "wrapped_native": {
                    "address": "0x2323232323232323232323232323232323232323"
                },
                "staked": {
                    "address": "0x2424242424242424242424242424242424242424",
                    "wrapper": "0x2525252525252525252525252525252525252525",
                    "seed_shares": 456789,
                    "seed_pooled": 3333
                }
            }"#,
        )
        .unwrap();

        let config = resolve_scenario_config(raw);
        assert_eq!(config.start_timestamp, 1_700_000_000);
        assert_eq!(config.deadline_margin, 600);
        assert_eq!(config.user_funding, 1_000_000);
        assert_eq!(config.vault.seed_assets, 12_345_678);
    }
}
