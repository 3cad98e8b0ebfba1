//! Vault Admin Tests
//!
//! Risk parameters, fees, manager role, oracle wiring and governance.

mod common;

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::*;

use common::{setup, single_feed_config, wad, VaultParams, LP_PRICE, WAD};
use utoken_casper::errors::Error;
use utoken_casper::math::SECOND_BASE;
use utoken_casper::mocks::{MockPriceOracle, MockPriceOracleInitArgs};
use utoken_casper::vault::OracleConfig;

#[test]
fn test_initial_configuration() {
    let env = odra_test::env();
    let p = setup(&env);
    let defaults = VaultParams::default();

    assert_eq!(p.vault.ltv(), defaults.ltv);
    assert_eq!(p.vault.cr(), defaults.cr);
    assert_eq!(p.vault.protocol_fee(), defaults.protocol_fee);
    assert_eq!(p.vault.stake_fee(), defaults.stake_fee);
    assert_eq!(p.vault.mint_limit(), defaults.mint_limit);
    assert_eq!(p.vault.pair(), Some(p.pair.address()));
    assert_eq!(p.vault.stablecoin(), Some(p.stablecoin.address()));
    assert_eq!(p.vault.staking_pool(), Some(p.staking_pool));
    assert_eq!(p.vault.factory(), Some(p.factory.address()));
    assert_eq!(p.vault.oracle(), Some(p.oracle));
    assert_eq!(p.vault.governance(), Some(p.governance));
    assert_eq!(p.vault.manager(), None);
    assert_eq!(p.vault.collateral_price(), U256::from(LP_PRICE));
}

#[test]
fn test_manager_sets_risk_parameters() {
    let env = odra_test::env();
    let mut p = setup(&env);
    let manager = env.get_account(3);

    p.vault.set_manager(Some(manager));
    assert_eq!(p.vault.manager(), Some(manager));

    env.set_caller(manager);
    p.vault.set_ltv(20_000_000);
    p.vault.set_cr(90_000_000);
    assert_eq!(p.vault.ltv(), 20_000_000);
    assert_eq!(p.vault.cr(), 90_000_000);

    // Manager cannot touch governance-only settings
    assert_eq!(p.vault.try_set_fees(0, 0), Err(Error::Unauthorized.into()));
    assert_eq!(
        p.vault.try_set_mint_limit(U256::zero()),
        Err(Error::Unauthorized.into())
    );
}

#[test]
fn test_governance_sets_risk_parameters_and_ltv_applies() {
    let env = odra_test::env();
    let mut p = setup(&env);
    p.vault.set_ltv(20_000_000);

    let user = env.get_account(1);
    p.fund_lp(&env, user, U256::from(WAD));
    p.vault.lock(U256::from(WAD), user, U256::zero(), None);
    assert_eq!(p.vault.debt_of(user), U256::from(LP_PRICE / 5));
}

#[test]
fn test_risk_parameter_validation() {
    let env = odra_test::env();
    let mut p = setup(&env);

    assert_eq!(
        p.vault.try_set_ltv(SECOND_BASE),
        Err(Error::InvalidConfiguration.into())
    );
    // LTV above CR
    assert_eq!(
        p.vault.try_set_ltv(p.vault.cr() + 1),
        Err(Error::InvalidConfiguration.into())
    );
    assert_eq!(
        p.vault.try_set_cr(p.vault.ltv() - 1),
        Err(Error::InvalidConfiguration.into())
    );
    p.vault.set_cr(p.vault.ltv());
}

#[test]
fn test_unauthorized_risk_update_reverts() {
    let env = odra_test::env();
    let mut p = setup(&env);
    env.set_caller(env.get_account(1));
    assert_eq!(
        p.vault.try_set_ltv(5_000_000),
        Err(Error::Unauthorized.into())
    );
    assert_eq!(
        p.vault.try_set_manager(Some(env.get_account(1))),
        Err(Error::Unauthorized.into())
    );
}

#[test]
fn test_removed_manager_loses_access() {
    let env = odra_test::env();
    let mut p = setup(&env);
    let manager = env.get_account(3);
    p.vault.set_manager(Some(manager));
    p.vault.set_manager(None);

    env.set_caller(manager);
    assert_eq!(
        p.vault.try_set_ltv(5_000_000),
        Err(Error::Unauthorized.into())
    );
}

#[test]
fn test_fee_validation() {
    let env = odra_test::env();
    let mut p = setup(&env);

    p.vault.set_fees(1_000_000, 2_000_000);
    assert_eq!(p.vault.protocol_fee(), 1_000_000);
    assert_eq!(p.vault.stake_fee(), 2_000_000);
    assert_eq!(p.vault.fees(), (1_000_000, 2_000_000));

    assert_eq!(
        p.vault.try_set_fees(SECOND_BASE / 2, SECOND_BASE / 2),
        Err(Error::InvalidConfiguration.into())
    );
}

#[test]
fn test_staking_pool_update_redirects_stake_fee() {
    let env = odra_test::env();
    let mut p = setup(&env);
    let new_pool = env.get_account(6);
    p.vault.set_staking_pool(new_pool);
    assert_eq!(p.vault.staking_pool(), Some(new_pool));

    let user = env.get_account(1);
    p.fund_lp(&env, user, U256::from(WAD));
    p.vault.lock(U256::from(WAD), user, U256::zero(), None);
    assert!(p.stablecoin.balance_of(new_pool) > U256::zero());
    assert_eq!(p.stablecoin.balance_of(p.staking_pool), U256::zero());
}

#[test]
fn test_set_oracle() {
    let env = odra_test::env();
    let mut p = setup(&env);
    let new_oracle = MockPriceOracle::deploy(&env, MockPriceOracleInitArgs { price: wad(100) });

    p.vault
        .set_oracle(new_oracle.address(), single_feed_config(env.get_account(8)));
    assert_eq!(p.vault.oracle(), Some(new_oracle.address()));
    assert_eq!(p.vault.collateral_price(), wad(100));

    let bad = OracleConfig {
        is_base: vec![false, false],
        ..single_feed_config(env.get_account(8))
    };
    assert_eq!(
        p.vault.try_set_oracle(new_oracle.address(), bad),
        Err(Error::InvalidConfiguration.into())
    );
}

#[test]
fn test_price_change_moves_minted_amount() {
    let env = odra_test::env();
    let mut p = setup(&env);
    let mut oracle = p.mock_oracle(&env);
    oracle.set_price(wad(1_000));

    let user = env.get_account(1);
    p.fund_lp(&env, user, U256::from(WAD));
    p.vault.lock(U256::from(WAD), user, U256::zero(), None);
    assert_eq!(p.vault.debt_of(user), wad(100));
}

#[test]
fn test_vault_governance_handover() {
    let env = odra_test::env();
    let mut p = setup(&env);
    let next = env.get_account(5);

    p.vault.change_governance(next);
    assert_eq!(p.vault.pending_governance(), Some(next));
    env.set_caller(next);
    p.vault.accept_governance();
    assert_eq!(p.vault.governance(), Some(next));

    p.vault.set_mint_limit(wad(5));
    assert_eq!(p.vault.mint_limit(), wad(5));
}
