use std::env;
use std::path::Path;
use std::sync::Arc;

use alloy_primitives::U256;
use tracing_subscriber::EnvFilter;

use asset_transformers::config::ScenarioConfig;
use asset_transformers::{
    Erc4626Transformer, InMemoryLedger, Ledger, ProtocolTokenWrapperTransformer,
    StakedTokenTransformer, TransformContext, Transformer, TransformerRegistration,
    TransformerRegistry, UnderlyingAmount, PROTOCOL_TOKEN,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let config_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("config/scenario.json");
    let config = ScenarioConfig::load(Path::new(config_path))?;

    let ledger = build_world(&config);
    let registry = build_registry(&config)?;

    tracing::info!(
        "Scenario ready: {} dependent(s) registered, clock at {}",
        registry.registered_count(),
        ledger.timestamp()
    );

    run_vault_flow(&config, &ledger, &registry)?;
    run_wrapped_native_flow(&config, &ledger, &registry)?;
    run_staked_flow(&config, &ledger, &registry)?;
    report_dust(&config, &ledger, &registry)?;

    tracing::info!("All scenario flows completed");
    Ok(())
}

fn build_world(config: &ScenarioConfig) -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new();
    ledger.set_timestamp(config.start_timestamp);

    ledger.deploy_erc20(config.vault.asset);
    ledger.deploy_vault(config.vault.address, config.vault.asset);
    ledger.mint_erc20(
        config.vault.address,
        config.accounts.governor,
        U256::from(config.vault.seed_shares),
    );
    ledger.mint_erc20(
        config.vault.asset,
        config.vault.address,
        U256::from(config.vault.seed_assets),
    );

    ledger.deploy_wrapped_native(config.wrapped_native.address);

    // The user holds the staked seed so the wrap flow has something to pull.
    ledger.deploy_staked(
        config.staked.address,
        config.accounts.user,
        U256::from(config.staked.seed_shares),
        U256::from(config.staked.seed_pooled),
    );
    ledger.deploy_wrapped_staked(config.staked.wrapper, config.staked.address);

    ledger.mint_erc20(
        config.vault.asset,
        config.accounts.user,
        U256::from(config.user_funding),
    );
    ledger.mint_native(config.accounts.user, U256::from(config.user_funding));

    ledger
}

fn build_registry(config: &ScenarioConfig) -> anyhow::Result<TransformerRegistry> {
    let governor = config.accounts.governor;
    let mut registry = TransformerRegistry::new(config.protocol.registry, governor)?;

    registry.register_transformers(
        governor,
        vec![
            TransformerRegistration::new(
                Arc::new(Erc4626Transformer::new(config.protocol.vault_transformer)),
                vec![config.vault.address],
            ),
            TransformerRegistration::new(
                Arc::new(ProtocolTokenWrapperTransformer::new(
                    config.protocol.wrapped_native_transformer,
                )),
                vec![config.wrapped_native.address],
            ),
            TransformerRegistration::new(
                Arc::new(StakedTokenTransformer::new(
                    config.protocol.staked_transformer,
                    config.staked.address,
                )),
                vec![config.staked.wrapper],
            ),
        ],
    )?;

    Ok(registry)
}

fn first_amount(amounts: &[UnderlyingAmount]) -> U256 {
    amounts.first().map(|entry| entry.amount).unwrap_or_default()
}

/// Deposit assets into the vault through the registry, then redeem the
/// resulting shares back out to the recipient.
fn run_vault_flow(
    config: &ScenarioConfig,
    ledger: &InMemoryLedger,
    registry: &TransformerRegistry,
) -> anyhow::Result<()> {
    let user = config.accounts.user;
    let vault = config.vault.address;
    let asset = config.vault.asset;
    let ctx = TransformContext::new(ledger, user, registry.identity());
    let deadline = ledger.timestamp() + config.deadline_margin;

    let assets_in = U256::from(config.user_funding / 2);
    let deposit = [UnderlyingAmount::new(asset, assets_in)];
    let quoted_shares = registry.calculate_transform_to_dependent(&ctx, vault, &deposit)?;

    ledger.erc20(asset)?.approve(user, registry.identity(), assets_in)?;
    let minted = registry.transform_to_dependent(&ctx, vault, &deposit, user, quoted_shares, deadline)?;
    tracing::info!("Vault flow: {} assets in, {} shares minted", assets_in, minted);

    let quoted_out = registry.calculate_transform_to_underlying(&ctx, vault, minted)?;
    ledger.erc20(vault)?.approve(user, registry.identity(), minted)?;
    let received = registry.transform_to_underlying(
        &ctx,
        vault,
        minted,
        config.accounts.recipient,
        &quoted_out,
        deadline,
    )?;
    tracing::info!(
        "Vault flow: {} shares redeemed for {} assets to {}",
        minted,
        first_amount(&received),
        config.accounts.recipient
    );
    Ok(())
}

/// Wrap attached native value, then unwrap the tokens back to native.
fn run_wrapped_native_flow(
    config: &ScenarioConfig,
    ledger: &InMemoryLedger,
    registry: &TransformerRegistry,
) -> anyhow::Result<()> {
    let user = config.accounts.user;
    let wrapped = config.wrapped_native.address;
    let deadline = ledger.timestamp() + config.deadline_margin;
    let amount = U256::from(config.user_funding / 4);

    let ctx = TransformContext::new(ledger, user, registry.identity()).with_value(amount);
    let minted = registry.transform_to_dependent(
        &ctx,
        wrapped,
        &[UnderlyingAmount::new(PROTOCOL_TOKEN, amount)],
        user,
        amount,
        deadline,
    )?;
    tracing::info!("Wrapped native flow: {} native wrapped into {} tokens", amount, minted);

    let ctx = TransformContext::new(ledger, user, registry.identity());
    ledger.erc20(wrapped)?.approve(user, registry.identity(), minted)?;
    let received = registry.transform_to_underlying(
        &ctx,
        wrapped,
        minted,
        config.accounts.recipient,
        &[UnderlyingAmount::new(PROTOCOL_TOKEN, minted)],
        deadline,
    )?;
    tracing::info!(
        "Wrapped native flow: {} tokens unwrapped to {} native",
        minted,
        first_amount(&received)
    );
    Ok(())
}

/// Wrap part of the user's rebasing staked balance, then unwrap it back.
fn run_staked_flow(
    config: &ScenarioConfig,
    ledger: &InMemoryLedger,
    registry: &TransformerRegistry,
) -> anyhow::Result<()> {
    let user = config.accounts.user;
    let staked = config.staked.address;
    let wrapper = config.staked.wrapper;
    let ctx = TransformContext::new(ledger, user, registry.identity());
    let deadline = ledger.timestamp() + config.deadline_margin;

    let amount = U256::from(config.staked.seed_pooled / 10);
    let stake = [UnderlyingAmount::new(staked, amount)];
    let quoted = registry.calculate_transform_to_dependent(&ctx, wrapper, &stake)?;

    ledger.erc20(staked)?.approve(user, registry.identity(), amount)?;
    let minted = registry.transform_to_dependent(&ctx, wrapper, &stake, user, quoted, deadline)?;
    tracing::info!("Staked flow: {} staked wrapped into {} tokens", amount, minted);

    let quoted_back = registry.calculate_transform_to_underlying(&ctx, wrapper, minted)?;
    ledger.erc20(wrapper)?.approve(user, registry.identity(), minted)?;
    let received = registry.transform_to_underlying(
        &ctx,
        wrapper,
        minted,
        config.accounts.recipient,
        &quoted_back,
        deadline,
    )?;
    tracing::info!(
        "Staked flow: {} tokens unwrapped to {} staked",
        minted,
        first_amount(&received)
    );
    Ok(())
}

/// Report anything stranded on the registry after the flows ran.
fn report_dust(
    config: &ScenarioConfig,
    ledger: &InMemoryLedger,
    registry: &TransformerRegistry,
) -> anyhow::Result<()> {
    let watched = [
        config.vault.asset,
        config.staked.address,
        PROTOCOL_TOKEN,
    ];
    let balances = registry.dust_balances(ledger, &watched)?;
    for entry in balances {
        if !entry.balance.is_zero() {
            tracing::info!("Dust on registry: {} of {}", entry.balance, entry.token);
        }
    }
    Ok(())
}
