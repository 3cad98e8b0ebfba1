//! Yield Wallet Tests
//!
//! Routing locked collateral through per-user yield wallets and sharing
//! farm rewards between them.

mod common;

use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef};
use odra::prelude::*;

use common::{setup, wad, Protocol, WAD};
use utoken_casper::errors::Error;
use utoken_casper::mocks::{
    MockFarm, MockFarmHostRef, MockFarmInitArgs, TestToken, TestTokenHostRef, TestTokenInitArgs,
};
use utoken_casper::timelock::{TimelockStatus, YIELD_FACTORY_TIMELOCK};
use utoken_casper::yield_wallet::{
    YieldWalletRegistry, YieldWalletRegistryHostRef, YieldWalletRegistryInitArgs,
};

struct Farming {
    p: Protocol,
    reward: TestTokenHostRef,
    farm: MockFarmHostRef,
    registry: YieldWalletRegistryHostRef,
}

impl Farming {
    /// Credit `amount` of farm rewards to the registry
    fn accrue(&mut self, env: &HostEnv, amount: U256) {
        env.set_caller(self.p.governance);
        self.reward.mint(self.farm.address(), amount);
        self.farm.accrue(self.registry.address(), amount);
    }
}

fn deploy_farming(env: &HostEnv, enable: bool) -> Farming {
    let mut p = setup(env);
    env.set_caller(p.governance);
    let reward = TestToken::deploy(
        env,
        TestTokenInitArgs {
            name: "Farm Reward".to_string(),
            symbol: "RWD".to_string(),
            decimals: 18,
        },
    );
    let farm = MockFarm::deploy(
        env,
        MockFarmInitArgs {
            lp_token: p.pair.address(),
            reward_token: reward.address(),
        },
    );
    let registry = YieldWalletRegistry::deploy(
        env,
        YieldWalletRegistryInitArgs {
            lp_token: p.pair.address(),
            farm: farm.address(),
            reward_token: reward.address(),
        },
    );
    if enable {
        p.vault.enable_yield_wallet_factory(registry.address());
        env.advance_block_time(YIELD_FACTORY_TIMELOCK * 1000);
        p.vault.execute_enable_yield_wallet_factory(registry.address());
    }
    Farming {
        p,
        reward,
        farm,
        registry,
    }
}

fn lock_into_wallet(env: &HostEnv, f: &mut Farming, user: Address, amount: U256) {
    f.p.fund_lp(env, user, amount);
    f.p.vault
        .lock(amount, user, U256::zero(), Some(f.registry.address()));
}

// ==========================================
// Factory allow-list on the vault
// ==========================================

#[test]
fn test_yield_factory_requires_timelock() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, false);
    let registry = f.registry.address();

    f.p.vault.enable_yield_wallet_factory(registry);
    assert_eq!(
        f.p.vault.yield_wallet_factory_timelock(registry).status,
        TimelockStatus::PendingEnable
    );
    assert_eq!(
        f.p.vault.try_execute_enable_yield_wallet_factory(registry),
        Err(Error::TimelockNotElapsed.into())
    );
    assert!(!f.p.vault.is_yield_wallet_factory(registry));

    env.advance_block_time(YIELD_FACTORY_TIMELOCK * 1000);
    f.p.vault.execute_enable_yield_wallet_factory(registry);
    assert!(f.p.vault.is_yield_wallet_factory(registry));
}

#[test]
fn test_lock_into_unapproved_factory_reverts() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, false);
    let user = env.get_account(1);
    f.p.fund_lp(&env, user, U256::from(WAD));

    assert_eq!(
        f.p.vault
            .try_lock(U256::from(WAD), user, U256::zero(), Some(f.registry.address())),
        Err(Error::Unauthorized.into())
    );
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_enable_yield_factory_by_non_governance_reverts() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, false);
    env.set_caller(env.get_account(1));
    f.p.vault.enable_yield_wallet_factory(f.registry.address());
}

// ==========================================
// Deposit / withdraw routing
// ==========================================

#[test]
fn test_lock_routes_collateral_into_farm() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);

    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    let wallet = f.p.vault.yield_wallet_of(user).map(|w| (w.factory, w.wallet_id));
    assert_eq!(wallet, Some((f.registry.address(), 0)));
    assert_eq!(f.registry.owner_of(0), Some(user));
    assert_eq!(f.registry.wallet_count(), 1);
    assert_eq!(f.registry.wallet_info(0).amount, U256::from(WAD));
    assert_eq!(f.p.vault.yield_wallet_deposit_of(user), U256::from(WAD));
    assert_eq!(f.farm.staked_of(f.registry.address()), U256::from(WAD));
    assert_eq!(f.p.pair.balance_of(f.p.vault.address()), U256::zero());
    // Accounting on the vault is unchanged by routing
    assert_eq!(f.p.vault.collateral_of(user), U256::from(WAD));
}

#[test]
fn test_second_lock_reuses_wallet() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);

    lock_into_wallet(&env, &mut f, user, U256::from(WAD));
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    assert_eq!(f.registry.wallet_count(), 1);
    assert_eq!(f.registry.wallet_info(0).amount, U256::from(2 * WAD));
    assert_eq!(f.p.vault.yield_wallet_deposit_of(user), U256::from(2 * WAD));
}

#[test]
fn test_mixed_plain_and_routed_collateral_unlocks_wallet_part_first() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);

    lock_into_wallet(&env, &mut f, user, U256::from(WAD));
    f.p.fund_lp(&env, user, U256::from(WAD));
    f.p.vault.lock(U256::from(WAD), user, U256::zero(), None);
    assert_eq!(f.p.pair.balance_of(f.p.vault.address()), U256::from(WAD));

    f.p.vault.unlock(U256::zero(), U256::from(WAD + WAD / 2));
    assert_eq!(f.p.vault.yield_wallet_deposit_of(user), U256::zero());
    assert_eq!(f.farm.staked_of(f.registry.address()), U256::zero());
    assert_eq!(f.p.pair.balance_of(f.p.vault.address()), U256::from(WAD / 2));
    assert_eq!(f.p.pair.balance_of(user), U256::from(WAD + WAD / 2));
}

#[test]
fn test_unlock_withdraws_from_wallet() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    f.p.vault.unlock(U256::zero(), U256::from(WAD / 4));

    assert_eq!(f.registry.wallet_info(0).amount, U256::from(WAD * 3 / 4));
    assert_eq!(f.farm.staked_of(f.registry.address()), U256::from(WAD * 3 / 4));
    assert_eq!(f.p.vault.yield_wallet_deposit_of(user), U256::from(WAD * 3 / 4));
    assert_eq!(f.p.pair.balance_of(user), U256::from(WAD / 4));
}

#[test]
fn test_wallet_bound_to_first_factory() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    // A second approved registry
    env.set_caller(f.p.governance);
    let other = YieldWalletRegistry::deploy(
        &env,
        YieldWalletRegistryInitArgs {
            lp_token: f.p.pair.address(),
            farm: f.farm.address(),
            reward_token: f.reward.address(),
        },
    );
    f.p.vault.enable_yield_wallet_factory(other.address());
    env.advance_block_time(YIELD_FACTORY_TIMELOCK * 1000);
    f.p.vault.execute_enable_yield_wallet_factory(other.address());

    f.p.fund_lp(&env, user, U256::from(WAD));
    assert_eq!(
        f.p.vault
            .try_lock(U256::from(WAD), user, U256::zero(), Some(other.address())),
        Err(Error::InvalidConfiguration.into())
    );
}

#[test]
fn test_disabled_factory_still_allows_withdrawal() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    env.set_caller(f.p.governance);
    f.p.vault.disable_yield_wallet_factory(f.registry.address());
    assert!(!f.p.vault.is_yield_wallet_factory(f.registry.address()));

    env.set_caller(user);
    f.p.vault.unlock(U256::zero(), U256::from(WAD));
    assert_eq!(f.p.pair.balance_of(user), U256::from(WAD));

    f.p.fund_lp(&env, user, U256::from(WAD));
    assert_eq!(
        f.p.vault
            .try_lock(U256::from(WAD), user, U256::zero(), Some(f.registry.address())),
        Err(Error::Unauthorized.into())
    );
}

// ==========================================
// Rewards
// ==========================================

#[test]
fn test_claim_rewards() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    f.accrue(&env, wad(100));
    assert_eq!(f.p.vault.pending_rewards(user), wad(100));

    env.set_caller(user);
    f.p.vault.claim_rewards(f.reward.address());
    assert_eq!(f.reward.balance_of(user), wad(100));
    assert_eq!(f.p.vault.pending_rewards(user), U256::zero());
}

#[test]
fn test_rewards_shared_by_stake_over_time() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let alice = env.get_account(1);
    let bob = env.get_account(2);

    lock_into_wallet(&env, &mut f, alice, U256::from(WAD));
    f.accrue(&env, wad(100));
    // Bob's deposit harvests the first 100 for Alice alone
    lock_into_wallet(&env, &mut f, bob, U256::from(WAD));
    f.accrue(&env, wad(50));

    assert_eq!(f.p.vault.pending_rewards(alice), wad(125));
    assert_eq!(f.p.vault.pending_rewards(bob), wad(25));

    env.set_caller(bob);
    f.p.vault.claim_rewards(f.reward.address());
    env.set_caller(alice);
    f.p.vault.claim_rewards(f.reward.address());
    assert_eq!(f.reward.balance_of(alice), wad(125));
    assert_eq!(f.reward.balance_of(bob), wad(25));
}

#[test]
fn test_rewards_survive_full_withdrawal() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));
    f.accrue(&env, wad(10));

    env.set_caller(user);
    f.p.vault.unlock(U256::zero(), U256::from(WAD));
    assert_eq!(f.p.vault.pending_rewards(user), wad(10));

    f.p.vault.claim_rewards(f.reward.address());
    assert_eq!(f.reward.balance_of(user), wad(10));
}

#[test]
fn test_claim_wrong_token_reverts() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    assert_eq!(
        f.p.vault.try_claim_rewards(f.p.stablecoin.address()),
        Err(Error::InvalidAddress.into())
    );
}

#[test]
#[should_panic(expected = "NoYieldWallet")]
fn test_claim_without_wallet_reverts() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    env.set_caller(env.get_account(1));
    f.p.vault.claim_rewards(f.reward.address());
}

#[test]
fn test_registry_only_obeys_wallet_vault() {
    let env = odra_test::env();
    let mut f = deploy_farming(&env, true);
    let user = env.get_account(1);
    lock_into_wallet(&env, &mut f, user, U256::from(WAD));

    // The owner cannot bypass the vault to pull collateral out
    env.set_caller(user);
    assert_eq!(
        f.registry.try_withdraw(0, U256::from(WAD)),
        Err(Error::Unauthorized.into())
    );
    assert_eq!(
        f.registry.try_claim(0, f.reward.address(), user),
        Err(Error::Unauthorized.into())
    );
    assert_eq!(
        f.registry.try_deposit(7, U256::from(1u64)),
        Err(Error::NoYieldWallet.into())
    );
}
