//! Shared deployment helpers for the protocol tests.

#![allow(dead_code)]

use odra::casper_types::bytesrepr::Bytes;
use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::*;

use utoken_casper::factory::{VaultFactory, VaultFactoryHostRef};
use utoken_casper::math::SECOND_BASE;
use utoken_casper::mocks::{
    MockLpPair, MockLpPairHostRef, MockLpPairInitArgs, MockPriceFeed, MockPriceFeedHostRef,
    MockPriceFeedInitArgs, MockPriceOracle, MockPriceOracleHostRef, MockPriceOracleInitArgs,
};
use utoken_casper::oracle::LpOracle;
use utoken_casper::stablecoin::{Stablecoin, StablecoinHostRef, StablecoinInitArgs};
use utoken_casper::timelock::MINTER_TIMELOCK;
use utoken_casper::vault::{OracleConfig, Vault, VaultHostRef, VaultInitArgs};

pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Price of 1e18 LP units used by the fee scenarios (~565.69 uToken)
pub const LP_PRICE: u128 = 565_685_424_949_238_019_520;

/// Pool where 1e18 LP units are worth `LP_PRICE` at an ETH price of 2000
pub const BASE_RESERVE: u128 = 282_842_712_474_619_009_760;
pub const ETH_RESERVE: u128 = 141_421_356_237_309_505;
pub const ETH_USD_8DEC: u64 = 200_000_000_000;

/// 10% LTV
pub const LTV_10: u64 = 10_000_000;
/// 0.5% fee
pub const FEE_HALF_PERCENT: u64 = 500_000;
/// 3% oracle tolerance
pub const MAX_PERCENT_DIFF: u64 = 3_000_000;
pub const ALLOWED_DELAY: u64 = 3_600;

pub fn wad(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WAD)
}

pub fn days_ms(days: u64) -> u64 {
    days * 86_400 * 1000
}

pub struct VaultParams {
    pub ltv: u64,
    pub cr: u64,
    pub protocol_fee: u64,
    pub stake_fee: u64,
    pub mint_limit: U256,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            ltv: LTV_10,
            cr: SECOND_BASE * 8 / 10,
            protocol_fee: FEE_HALF_PERCENT,
            stake_fee: FEE_HALF_PERCENT,
            mint_limit: wad(1_000_000),
        }
    }
}

pub struct Protocol {
    pub stablecoin: StablecoinHostRef,
    pub factory: VaultFactoryHostRef,
    pub pair: MockLpPairHostRef,
    pub vault: VaultHostRef,
    pub oracle: Address,
    pub governance: Address,
    pub staking_pool: Address,
}

impl Protocol {
    /// Mint LP tokens to `user` and approve the vault for them.
    /// Leaves `user` as the caller.
    pub fn fund_lp(&mut self, env: &HostEnv, user: Address, amount: U256) {
        self.pair.mint(user, amount);
        env.set_caller(user);
        self.pair.approve(self.vault.address(), amount);
    }

    /// Move LP tokens from the liquidity provider to `user` (keeps the
    /// pool supply unchanged) and approve the vault. Leaves `user` as the
    /// caller.
    pub fn provide_lp(&mut self, env: &HostEnv, user: Address, amount: U256) {
        env.set_caller(liquidity_provider(env));
        self.pair.transfer(user, amount);
        env.set_caller(user);
        self.pair.approve(self.vault.address(), amount);
    }

    pub fn mock_oracle(&self, env: &HostEnv) -> MockPriceOracleHostRef {
        MockPriceOracleHostRef::new(self.oracle, env.clone())
    }
}

pub fn liquidity_provider(env: &HostEnv) -> Address {
    env.get_account(7)
}

pub fn single_feed_config(feed: Address) -> OracleConfig {
    OracleConfig {
        decimals: Bytes::from(vec![18, 18]),
        feeds: vec![feed],
        is_base: vec![true, false],
        max_percent_diff: MAX_PERCENT_DIFF,
        allowed_delay: ALLOWED_DELAY,
    }
}

/// Protocol with a fixed-price oracle answering `LP_PRICE`
pub fn setup(env: &HostEnv) -> Protocol {
    setup_with(env, VaultParams::default(), U256::from(LP_PRICE))
}

pub fn setup_with(env: &HostEnv, params: VaultParams, price: U256) -> Protocol {
    env.set_caller(env.get_account(0));
    let oracle = MockPriceOracle::deploy(env, MockPriceOracleInitArgs { price });
    let config = single_feed_config(env.get_account(8));
    deploy_protocol(env, params, oracle.address(), config)
}

/// Protocol priced by `LpOracle` over the mock pair and one ETH/USD feed
pub fn setup_with_lp_oracle(env: &HostEnv, params: VaultParams) -> (Protocol, MockPriceFeedHostRef) {
    env.set_caller(env.get_account(0));
    let oracle = LpOracle::deploy(env, NoArgs);
    let mut feed = MockPriceFeed::deploy(
        env,
        MockPriceFeedInitArgs {
            decimals: 8,
            answer: U256::from(ETH_USD_8DEC),
        },
    );
    let config = single_feed_config(feed.address());
    let protocol = deploy_protocol(env, params, oracle.address(), config);

    // Activation advanced the clock; publish a fresh round.
    env.set_caller(env.get_account(0));
    feed.set_answer(U256::from(ETH_USD_8DEC));
    (protocol, feed)
}

/// Deploy stablecoin, factory, pair and vault, then register the vault,
/// enable it on the factory and make it a minter. Account 0 is governance.
pub fn deploy_protocol(
    env: &HostEnv,
    params: VaultParams,
    oracle: Address,
    oracle_config: OracleConfig,
) -> Protocol {
    let governance = env.get_account(0);
    let staking_pool = env.get_account(9);
    env.set_caller(governance);

    let mut stablecoin = Stablecoin::deploy(
        env,
        StablecoinInitArgs {
            name: "uToken".to_string(),
            symbol: "UTKN".to_string(),
        },
    );
    let mut factory = VaultFactory::deploy(env, NoArgs);
    let pair = MockLpPair::deploy(
        env,
        MockLpPairInitArgs {
            reserve0: U256::from(BASE_RESERVE),
            reserve1: U256::from(ETH_RESERVE),
        },
    );
    let vault = Vault::deploy(
        env,
        VaultInitArgs {
            factory: factory.address(),
            pair: pair.address(),
            stablecoin: stablecoin.address(),
            staking_pool,
            oracle,
            oracle_config,
            ltv: params.ltv,
            cr: params.cr,
            protocol_fee: params.protocol_fee,
            stake_fee: params.stake_fee,
            mint_limit: params.mint_limit,
        },
    );

    factory.register_vault(vault.address());
    factory.enable_vault(vault.address());
    stablecoin.add_minter(vault.address());
    env.advance_block_time(MINTER_TIMELOCK * 1000);
    factory.execute_enable_vault(vault.address());
    stablecoin.enable_minter(vault.address());

    let mut protocol = Protocol {
        stablecoin,
        factory,
        pair,
        vault,
        oracle,
        governance,
        staking_pool,
    };
    // Pool LP supply matching the reserves
    protocol.pair.mint(liquidity_provider(env), U256::from(WAD));
    protocol
}
