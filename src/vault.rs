//! uToken LP Vault Contract
//!
//! A collateral-debt vault for one AMM LP-token market.
//! - Users lock LP tokens and receive uToken minted at the vault's LTV of
//!   the oracle-priced collateral value
//! - Protocol and staking fees are carved out of the minted amount; the
//!   full amount is recorded as debt
//! - Users unlock by burning uToken debt and withdrawing collateral, in any
//!   proportion
//! - Collateral can optionally be routed into a per-user yield wallet
//!
//! ## Units
//! - LP tokens and uToken: wad (U256, 18 decimals)
//! - LTV, CR, fees, safu share: `SECOND_BASE` (1e8 = 100%)

use odra::casper_types::bytesrepr::Bytes;
use odra::casper_types::{PublicKey, U256};
use odra::prelude::*;
use odra::ContractRef;

use crate::address::is_zero_address;
use crate::errors::Error;
use crate::external::{LpPairContractRef, PriceOracleContractRef, YieldWalletFactoryContractRef};
use crate::factory::VaultFactoryContractRef;
use crate::governance::events::{GovernanceAccepted, GovernanceProposed};
use crate::governance::Governance;
use crate::math::{fraction_of, mul_div, wad, SECOND_BASE};
use crate::oracle::base_index;
use crate::stablecoin::StablecoinContractRef;
use crate::timelock::{now_secs, Timelock, YIELD_FACTORY_TIMELOCK};

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct Locked {
        pub user: Address,
        pub collateral_amount: U256,
        pub minted: U256,
    }

    #[odra::event]
    pub struct Unlocked {
        pub user: Address,
        pub collateral_returned: U256,
        pub debt_repaid: U256,
    }

    #[odra::event]
    pub struct FeeDistributed {
        pub total: U256,
        pub safu_amount: U256,
        pub team_amount: U256,
    }

    #[odra::event]
    pub struct YieldWalletCreated {
        pub user: Address,
        pub factory: Address,
        pub wallet_id: u32,
    }

    #[odra::event]
    pub struct RewardsClaimed {
        pub user: Address,
        pub token: Address,
    }

    #[odra::event]
    pub struct YieldWalletFactoryProposed {
        pub factory: Address,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct YieldWalletFactoryEnabled {
        pub factory: Address,
    }

    #[odra::event]
    pub struct YieldWalletFactoryDisabled {
        pub factory: Address,
    }

    #[odra::event]
    pub struct RiskParametersUpdated {
        pub ltv: u64,
        pub cr: u64,
    }

    #[odra::event]
    pub struct FeesUpdated {
        pub protocol_fee: u64,
        pub stake_fee: u64,
    }

    #[odra::event]
    pub struct MintLimitUpdated {
        pub mint_limit: U256,
    }

    #[odra::event]
    pub struct ManagerSet {
        pub manager: Option<Address>,
    }

    #[odra::event]
    pub struct StakingPoolSet {
        pub staking_pool: Address,
    }

    #[odra::event]
    pub struct FeeRecipientsUpdated {
        pub team: Option<Address>,
        pub safu: Option<Address>,
        pub safu_share: u64,
    }

    #[odra::event]
    pub struct OracleUpdated {
        pub oracle: Address,
    }
}

// ==========================================
// Types
// ==========================================

/// Arguments forwarded to the price oracle for this vault's pair
#[odra::odra_type]
pub struct OracleConfig {
    /// Decimals of the pair's two tokens
    pub decimals: Bytes,
    pub feeds: Vec<Address>,
    pub is_base: Vec<bool>,
    pub max_percent_diff: u64,
    pub allowed_delay: u64,
}

/// Handle of a user's wallet inside a yield-wallet factory
#[odra::odra_type]
pub struct YieldWallet {
    pub factory: Address,
    pub wallet_id: u32,
}

/// Position info returned by `position`
#[odra::odra_type]
pub struct PositionInfo {
    pub collateral: U256,
    pub debt: U256,
    pub collateral_value: U256,
    /// Debt over collateral value, `SECOND_BASE` units
    pub current_ltv: u64,
    pub yield_wallet_deposit: U256,
}

/// Amounts produced by one lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintBreakdown {
    pub total_value: U256,
    pub gross: U256,
    pub protocol_fee: U256,
    pub stake_fee: U256,
    pub net: U256,
}

/// Split of the accrued protocol fees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSplit {
    pub safu_amount: U256,
    pub team_amount: U256,
}

/// Debt and fee amounts for locking `collateral` at `price`.
///
/// The gross amount is the debt; both fees come out of it.
pub fn mint_breakdown(
    collateral: U256,
    price: U256,
    ltv: u64,
    protocol_fee: u64,
    stake_fee: u64,
) -> Result<MintBreakdown, Error> {
    let total_value = mul_div(collateral, price, wad())?;
    let gross = fraction_of(total_value, ltv)?;
    let protocol_fee = fraction_of(gross, protocol_fee)?;
    let stake_fee = fraction_of(gross, stake_fee)?;
    let net = gross
        .checked_sub(protocol_fee)
        .and_then(|rest| rest.checked_sub(stake_fee))
        .ok_or(Error::Underflow)?;
    Ok(MintBreakdown {
        total_value,
        gross,
        protocol_fee,
        stake_fee,
        net,
    })
}

/// Split `balance` between safu and team.
pub fn fee_split(
    balance: U256,
    has_team: bool,
    has_safu: bool,
    safu_share: u64,
) -> Result<FeeSplit, Error> {
    if !has_team && !has_safu {
        return Err(Error::InvalidConfiguration);
    }
    if safu_share > 0 && !has_safu {
        return Err(Error::InvalidConfiguration);
    }
    if balance.is_zero() {
        return Err(Error::InvalidConfiguration);
    }
    let safu_amount = if has_team {
        fraction_of(balance, safu_share)?
    } else {
        balance
    };
    Ok(FeeSplit {
        safu_amount,
        team_amount: balance - safu_amount,
    })
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::Locked,
        events::Unlocked,
        events::FeeDistributed,
        events::YieldWalletCreated,
        events::RewardsClaimed,
        events::YieldWalletFactoryProposed,
        events::YieldWalletFactoryEnabled,
        events::YieldWalletFactoryDisabled,
        events::RiskParametersUpdated,
        events::FeesUpdated,
        events::MintLimitUpdated,
        events::ManagerSet,
        events::StakingPoolSet,
        events::FeeRecipientsUpdated,
        events::OracleUpdated,
        GovernanceProposed,
        GovernanceAccepted
    ],
    errors = Error
)]
pub struct Vault {
    // Roles
    governance: SubModule<Governance>,
    manager: Var<Option<Address>>,

    // Market wiring
    factory: Var<Address>,
    pair: Var<Address>,
    stablecoin: Var<Address>,
    staking_pool: Var<Address>,
    oracle: Var<Address>,
    oracle_config: Var<OracleConfig>,

    // Risk parameters
    ltv: Var<u64>,
    cr: Var<u64>,
    protocol_fee: Var<u64>,
    stake_fee: Var<u64>,
    mint_limit: Var<U256>,

    // Per-user ledger
    collateral: Mapping<Address, U256>,
    debt: Mapping<Address, U256>,

    // Aggregates
    minted: Var<U256>,
    total_collateral: Var<U256>,

    // Fee recipients
    team: Var<Option<Address>>,
    safu: Var<Option<Address>>,
    safu_share: Var<u64>,

    // Yield wallets
    yield_wallet_factories: Mapping<Address, Timelock>,
    yield_wallets: Mapping<Address, YieldWallet>,
    yield_wallet_deposit: Mapping<Address, U256>,
}

#[odra::module]
impl Vault {
    // ==========================================
    // Initialization
    // ==========================================

    /// Initialize the vault; the deployer becomes governance
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &mut self,
        factory: Address,
        pair: Address,
        stablecoin: Address,
        staking_pool: Address,
        oracle: Address,
        oracle_config: OracleConfig,
        ltv: u64,
        cr: u64,
        protocol_fee: u64,
        stake_fee: u64,
        mint_limit: U256,
    ) {
        for address in [&factory, &pair, &stablecoin, &staking_pool, &oracle] {
            if is_zero_address(address) {
                self.env().revert(Error::InvalidAddress);
            }
        }
        self.require_valid_oracle_config(&oracle_config);
        self.require_valid_risk(ltv, cr);
        self.require_valid_fees(protocol_fee, stake_fee);

        let caller = self.env().caller();
        self.governance.init(caller);
        self.manager.set(None);
        self.factory.set(factory);
        self.pair.set(pair);
        self.stablecoin.set(stablecoin);
        self.staking_pool.set(staking_pool);
        self.oracle.set(oracle);
        self.oracle_config.set(oracle_config);
        self.ltv.set(ltv);
        self.cr.set(cr);
        self.protocol_fee.set(protocol_fee);
        self.stake_fee.set(stake_fee);
        self.mint_limit.set(mint_limit);
        self.minted.set(U256::zero());
        self.total_collateral.set(U256::zero());
        self.team.set(None);
        self.safu.set(None);
        self.safu_share.set(0);
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Lock LP collateral and mint uToken to `recipient`.
    ///
    /// The caller must have approved the vault on the LP token. Reverts if
    /// the net amount minted to `recipient` is below `min_mint_amount`.
    /// With `yield_wallet_factory` set, the collateral is routed into the
    /// recipient's wallet in that factory.
    pub fn lock(
        &mut self,
        collateral_amount: U256,
        recipient: Address,
        min_mint_amount: U256,
        yield_wallet_factory: Option<Address>,
    ) {
        let owner = self.env().caller();
        self.lock_from(
            owner,
            collateral_amount,
            recipient,
            min_mint_amount,
            yield_wallet_factory,
        );
    }

    /// `lock` authorised by a signed LP-token permit instead of a prior
    /// approval. `owner_key` must belong to the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn lock_with_permit(
        &mut self,
        collateral_amount: U256,
        recipient: Address,
        min_mint_amount: U256,
        yield_wallet_factory: Option<Address>,
        deadline: u64,
        owner_key: PublicKey,
        signature: Bytes,
    ) {
        let owner = self.env().caller();
        if Address::Account(owner_key.to_account_hash()) != owner {
            self.env().revert(Error::Unauthorized);
        }
        let self_address = self.env().self_address();
        self.pair_ref()
            .permit(owner_key, self_address, collateral_amount, deadline, signature);
        self.lock_from(
            owner,
            collateral_amount,
            recipient,
            min_mint_amount,
            yield_wallet_factory,
        );
    }

    /// Burn `debt_to_repay` uToken from the caller and return
    /// `collateral_to_return` LP tokens. Amounts are independent.
    pub fn unlock(&mut self, debt_to_repay: U256, collateral_to_return: U256) {
        let caller = self.env().caller();

        if debt_to_repay.is_zero() && collateral_to_return.is_zero() {
            self.env().revert(Error::ZeroAmount);
        }

        let debt = self.debt.get(&caller).unwrap_or_default();
        let collateral = self.collateral.get(&caller).unwrap_or_default();
        if debt_to_repay > debt || collateral_to_return > collateral {
            self.env().revert(Error::Underflow);
        }

        if !debt_to_repay.is_zero() {
            self.stablecoin_ref().burn(caller, debt_to_repay);
        }

        self.debt.set(&caller, debt - debt_to_repay);
        self.collateral.set(&caller, collateral - collateral_to_return);
        let minted = self.minted.get_or_default();
        let new_minted = minted
            .checked_sub(debt_to_repay)
            .unwrap_or_else(|| self.env().revert(Error::Underflow));
        self.minted.set(new_minted);
        let total = self.total_collateral.get_or_default();
        let new_total = total
            .checked_sub(collateral_to_return)
            .unwrap_or_else(|| self.env().revert(Error::Underflow));
        self.total_collateral.set(new_total);

        if !collateral_to_return.is_zero() {
            self.withdraw_from_yield_wallet(caller, collateral_to_return);
            self.pair_ref().transfer(caller, collateral_to_return);
        }

        self.env().emit_event(events::Unlocked {
            user: caller,
            collateral_returned: collateral_to_return,
            debt_repaid: debt_to_repay,
        });
    }

    /// Claim farm rewards accrued by the caller's yield wallet
    pub fn claim_rewards(&mut self, token: Address) {
        let caller = self.env().caller();
        let wallet = self
            .yield_wallets
            .get(&caller)
            .unwrap_or_else(|| self.env().revert(Error::NoYieldWallet));
        let mut factory = YieldWalletFactoryContractRef::new(self.env().clone(), wallet.factory);
        factory.claim(wallet.wallet_id, token, caller);
        self.env().emit_event(events::RewardsClaimed {
            user: caller,
            token,
        });
    }

    /// Send the accrued protocol fees to safu and team
    pub fn distribute_fee(&mut self) {
        let self_address = self.env().self_address();
        let mut stablecoin = self.stablecoin_ref();
        let balance = stablecoin.balance_of(self_address);
        let team = self.team.get().flatten();
        let safu = self.safu.get().flatten();

        let split = fee_split(
            balance,
            team.is_some(),
            safu.is_some(),
            self.safu_share.get_or_default(),
        )
        .unwrap_or_else(|e| self.env().revert(e));

        if let Some(safu) = safu {
            if !split.safu_amount.is_zero() {
                stablecoin.transfer(safu, split.safu_amount);
            }
        }
        if let Some(team) = team {
            if !split.team_amount.is_zero() {
                stablecoin.transfer(team, split.team_amount);
            }
        }

        self.env().emit_event(events::FeeDistributed {
            total: balance,
            safu_amount: split.safu_amount,
            team_amount: split.team_amount,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    pub fn collateral_of(&self, user: Address) -> U256 {
        self.collateral.get(&user).unwrap_or_default()
    }

    pub fn debt_of(&self, user: Address) -> U256 {
        self.debt.get(&user).unwrap_or_default()
    }

    /// Net outstanding uToken minted by this vault
    pub fn minted(&self) -> U256 {
        self.minted.get_or_default()
    }

    pub fn mint_limit(&self) -> U256 {
        self.mint_limit.get_or_default()
    }

    pub fn total_collateral(&self) -> U256 {
        self.total_collateral.get_or_default()
    }

    /// Current oracle price of 1e18 LP units
    pub fn collateral_price(&self) -> U256 {
        let pair = self.pair.get_or_revert_with(Error::InvalidConfiguration);
        let oracle = self.oracle.get_or_revert_with(Error::InvalidConfiguration);
        let config = self
            .oracle_config
            .get_or_revert_with(Error::InvalidConfiguration);
        PriceOracleContractRef::new(self.env().clone(), oracle).latest_answer(
            pair,
            config.decimals,
            config.feeds,
            config.is_base,
            config.max_percent_diff,
            config.allowed_delay,
        )
    }

    /// Position of `user` valued at the current oracle price
    pub fn position(&self, user: Address) -> PositionInfo {
        let collateral = self.collateral_of(user);
        let debt = self.debt_of(user);
        let collateral_value = if collateral.is_zero() {
            U256::zero()
        } else {
            mul_div(collateral, self.collateral_price(), wad())
                .unwrap_or_else(|e| self.env().revert(e))
        };
        let current_ltv = if collateral_value.is_zero() {
            0
        } else {
            mul_div(debt, U256::from(SECOND_BASE), collateral_value)
                .unwrap_or_else(|e| self.env().revert(e))
                .min(U256::from(u64::MAX))
                .as_u64()
        };
        PositionInfo {
            collateral,
            debt,
            collateral_value,
            current_ltv,
            yield_wallet_deposit: self.yield_wallet_deposit_of(user),
        }
    }

    pub fn ltv(&self) -> u64 {
        self.ltv.get_or_default()
    }

    pub fn cr(&self) -> u64 {
        self.cr.get_or_default()
    }

    pub fn protocol_fee(&self) -> u64 {
        self.protocol_fee.get_or_default()
    }

    pub fn stake_fee(&self) -> u64 {
        self.stake_fee.get_or_default()
    }

    /// `(protocol_fee, stake_fee)`
    pub fn fees(&self) -> (u64, u64) {
        (self.protocol_fee(), self.stake_fee())
    }

    pub fn pair(&self) -> Option<Address> {
        self.pair.get()
    }

    pub fn stablecoin(&self) -> Option<Address> {
        self.stablecoin.get()
    }

    pub fn staking_pool(&self) -> Option<Address> {
        self.staking_pool.get()
    }

    pub fn factory(&self) -> Option<Address> {
        self.factory.get()
    }

    pub fn oracle(&self) -> Option<Address> {
        self.oracle.get()
    }

    pub fn manager(&self) -> Option<Address> {
        self.manager.get().flatten()
    }

    pub fn team(&self) -> Option<Address> {
        self.team.get().flatten()
    }

    pub fn safu(&self) -> Option<Address> {
        self.safu.get().flatten()
    }

    pub fn safu_share(&self) -> u64 {
        self.safu_share.get_or_default()
    }

    pub fn yield_wallet_of(&self, user: Address) -> Option<YieldWallet> {
        self.yield_wallets.get(&user)
    }

    pub fn yield_wallet_deposit_of(&self, user: Address) -> U256 {
        self.yield_wallet_deposit.get(&user).unwrap_or_default()
    }

    /// Rewards claimable by `user` through `claim_rewards`
    pub fn pending_rewards(&self, user: Address) -> U256 {
        match self.yield_wallets.get(&user) {
            Some(wallet) => YieldWalletFactoryContractRef::new(self.env().clone(), wallet.factory)
                .pending_rewards(wallet.wallet_id),
            None => U256::zero(),
        }
    }

    pub fn is_yield_wallet_factory(&self, factory: Address) -> bool {
        self.yield_wallet_factory_timelock(factory).is_active()
    }

    pub fn yield_wallet_factory_timelock(&self, factory: Address) -> Timelock {
        self.yield_wallet_factories.get(&factory).unwrap_or_default()
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Set loan-to-value (manager or governance)
    pub fn set_ltv(&mut self, ltv: u64) {
        self.require_manager_or_governance();
        let cr = self.cr.get_or_default();
        self.require_valid_risk(ltv, cr);
        self.ltv.set(ltv);
        self.env().emit_event(events::RiskParametersUpdated { ltv, cr });
    }

    /// Set collateralization ratio (manager or governance)
    pub fn set_cr(&mut self, cr: u64) {
        self.require_manager_or_governance();
        let ltv = self.ltv.get_or_default();
        self.require_valid_risk(ltv, cr);
        self.cr.set(cr);
        self.env().emit_event(events::RiskParametersUpdated { ltv, cr });
    }

    pub fn set_manager(&mut self, manager: Option<Address>) {
        self.governance.assert_governance();
        self.manager.set(manager);
        self.env().emit_event(events::ManagerSet { manager });
    }

    pub fn set_fees(&mut self, protocol_fee: u64, stake_fee: u64) {
        self.governance.assert_governance();
        self.require_valid_fees(protocol_fee, stake_fee);
        self.protocol_fee.set(protocol_fee);
        self.stake_fee.set(stake_fee);
        self.env().emit_event(events::FeesUpdated {
            protocol_fee,
            stake_fee,
        });
    }

    pub fn set_mint_limit(&mut self, mint_limit: U256) {
        self.governance.assert_governance();
        self.mint_limit.set(mint_limit);
        self.env().emit_event(events::MintLimitUpdated { mint_limit });
    }

    pub fn set_staking_pool(&mut self, staking_pool: Address) {
        self.governance.assert_governance();
        if is_zero_address(&staking_pool) {
            self.env().revert(Error::InvalidAddress);
        }
        self.staking_pool.set(staking_pool);
        self.env().emit_event(events::StakingPoolSet { staking_pool });
    }

    /// Configure fee recipients; `safu_share` is the safu fraction of fees
    pub fn set_fee_recipients(
        &mut self,
        team: Option<Address>,
        safu: Option<Address>,
        safu_share: u64,
    ) {
        self.governance.assert_governance();
        if safu_share > SECOND_BASE {
            self.env().revert(Error::InvalidConfiguration);
        }
        for address in [&team, &safu].into_iter().flatten() {
            if is_zero_address(address) {
                self.env().revert(Error::InvalidAddress);
            }
        }
        self.team.set(team);
        self.safu.set(safu);
        self.safu_share.set(safu_share);
        self.env().emit_event(events::FeeRecipientsUpdated {
            team,
            safu,
            safu_share,
        });
    }

    pub fn set_oracle(&mut self, oracle: Address, oracle_config: OracleConfig) {
        self.governance.assert_governance();
        if is_zero_address(&oracle) {
            self.env().revert(Error::InvalidAddress);
        }
        self.require_valid_oracle_config(&oracle_config);
        self.oracle.set(oracle);
        self.oracle_config.set(oracle_config);
        self.env().emit_event(events::OracleUpdated { oracle });
    }

    /// Propose a yield-wallet factory; usable after the timelock
    pub fn enable_yield_wallet_factory(&mut self, factory: Address) {
        self.governance.assert_governance();
        if is_zero_address(&factory) {
            self.env().revert(Error::InvalidAddress);
        }
        let now = now_secs(&self.env());
        let next = self
            .yield_wallet_factory_timelock(factory)
            .propose_enable(now)
            .unwrap_or_else(|e| self.env().revert(e));
        self.yield_wallet_factories.set(&factory, next);
        self.env().emit_event(events::YieldWalletFactoryProposed {
            factory,
            proposed_at: now,
        });
    }

    pub fn execute_enable_yield_wallet_factory(&mut self, factory: Address) {
        self.governance.assert_governance();
        let next = self
            .yield_wallet_factory_timelock(factory)
            .execute_enable(now_secs(&self.env()), YIELD_FACTORY_TIMELOCK)
            .unwrap_or_else(|e| self.env().revert(e));
        self.yield_wallet_factories.set(&factory, next);
        self.env().emit_event(events::YieldWalletFactoryEnabled { factory });
    }

    /// Stop routing new deposits to `factory`; existing wallets stay
    /// withdrawable
    pub fn disable_yield_wallet_factory(&mut self, factory: Address) {
        self.governance.assert_governance();
        let next = self.yield_wallet_factory_timelock(factory).revoke();
        self.yield_wallet_factories.set(&factory, next);
        self.env().emit_event(events::YieldWalletFactoryDisabled { factory });
    }

    // ==========================================
    // Governance
    // ==========================================

    pub fn governance(&self) -> Option<Address> {
        self.governance.governance()
    }

    pub fn pending_governance(&self) -> Option<Address> {
        self.governance.pending_governance()
    }

    pub fn change_governance(&mut self, new_governance: Address) {
        self.governance.change_governance(new_governance);
    }

    pub fn accept_governance(&mut self) {
        self.governance.accept_governance();
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn lock_from(
        &mut self,
        owner: Address,
        collateral_amount: U256,
        recipient: Address,
        min_mint_amount: U256,
        yield_wallet_factory: Option<Address>,
    ) {
        if collateral_amount.is_zero() {
            self.env().revert(Error::ZeroAmount);
        }
        if is_zero_address(&recipient) {
            self.env().revert(Error::InvalidAddress);
        }
        self.require_allowed();

        let self_address = self.env().self_address();
        self.pair_ref()
            .transfer_from(owner, self_address, collateral_amount);

        let price = self.collateral_price();
        let breakdown = mint_breakdown(
            collateral_amount,
            price,
            self.ltv.get_or_default(),
            self.protocol_fee.get_or_default(),
            self.stake_fee.get_or_default(),
        )
        .unwrap_or_else(|e| self.env().revert(e));

        let new_minted = self
            .minted
            .get_or_default()
            .checked_add(breakdown.gross)
            .unwrap_or_else(|| self.env().revert(Error::Overflow));
        if new_minted > self.mint_limit.get_or_default() {
            self.env().revert(Error::MintLimitExceeded);
        }
        if breakdown.net < min_mint_amount {
            self.env().revert(Error::SlippageExceeded);
        }

        let collateral = self.collateral.get(&recipient).unwrap_or_default();
        self.collateral.set(&recipient, collateral + collateral_amount);
        let debt = self.debt.get(&recipient).unwrap_or_default();
        self.debt.set(&recipient, debt + breakdown.gross);
        self.minted.set(new_minted);
        let total = self.total_collateral.get_or_default();
        self.total_collateral.set(total + collateral_amount);

        let staking_pool = self
            .staking_pool
            .get_or_revert_with(Error::InvalidConfiguration);
        let mut stablecoin = self.stablecoin_ref();
        if !breakdown.protocol_fee.is_zero() {
            stablecoin.mint(self_address, breakdown.protocol_fee);
        }
        if !breakdown.stake_fee.is_zero() {
            stablecoin.mint(staking_pool, breakdown.stake_fee);
        }
        if !breakdown.net.is_zero() {
            stablecoin.mint(recipient, breakdown.net);
        }

        if let Some(factory) = yield_wallet_factory {
            self.deposit_to_yield_wallet(recipient, factory, collateral_amount);
        }

        self.env().emit_event(events::Locked {
            user: recipient,
            collateral_amount,
            minted: breakdown.net,
        });
    }

    /// Get-or-create `user`'s wallet in `factory` and move `amount` into it
    fn deposit_to_yield_wallet(&mut self, user: Address, factory: Address, amount: U256) {
        if !self.is_yield_wallet_factory(factory) {
            self.env().revert(Error::Unauthorized);
        }
        let mut factory_ref = YieldWalletFactoryContractRef::new(self.env().clone(), factory);

        let wallet = match self.yield_wallets.get(&user) {
            Some(wallet) => {
                if wallet.factory != factory {
                    self.env().revert(Error::InvalidConfiguration);
                }
                wallet
            }
            None => {
                let wallet_id = factory_ref.create_yield_wallet(user);
                let wallet = YieldWallet { factory, wallet_id };
                self.yield_wallets.set(&user, wallet.clone());
                self.env().emit_event(events::YieldWalletCreated {
                    user,
                    factory,
                    wallet_id,
                });
                wallet
            }
        };

        self.pair_ref().transfer(factory, amount);
        factory_ref.deposit(wallet.wallet_id, amount);

        let deposited = self.yield_wallet_deposit.get(&user).unwrap_or_default();
        self.yield_wallet_deposit.set(&user, deposited + amount);
    }

    /// Pull back the part of `amount` that sits in `user`'s yield wallet
    fn withdraw_from_yield_wallet(&mut self, user: Address, amount: U256) {
        let deposited = self.yield_wallet_deposit.get(&user).unwrap_or_default();
        let from_wallet = amount.min(deposited);
        if from_wallet.is_zero() {
            return;
        }
        let wallet = self
            .yield_wallets
            .get(&user)
            .unwrap_or_else(|| self.env().revert(Error::NoYieldWallet));
        YieldWalletFactoryContractRef::new(self.env().clone(), wallet.factory)
            .withdraw(wallet.wallet_id, from_wallet);
        self.yield_wallet_deposit.set(&user, deposited - from_wallet);
    }

    fn require_allowed(&self) {
        let factory = self.factory.get_or_revert_with(Error::InvalidConfiguration);
        let allowed = VaultFactoryContractRef::new(self.env().clone(), factory)
            .is_allowed(self.env().self_address());
        if !allowed {
            self.env().revert(Error::Unauthorized);
        }
    }

    fn require_manager_or_governance(&self) {
        let caller = self.env().caller();
        if self.manager() != Some(caller) && !self.governance.is_governance(&caller) {
            self.env().revert(Error::Unauthorized);
        }
    }

    fn require_valid_risk(&self, ltv: u64, cr: u64) {
        if ltv >= SECOND_BASE || cr < ltv {
            self.env().revert(Error::InvalidConfiguration);
        }
    }

    fn require_valid_fees(&self, protocol_fee: u64, stake_fee: u64) {
        if protocol_fee.saturating_add(stake_fee) >= SECOND_BASE {
            self.env().revert(Error::InvalidConfiguration);
        }
    }

    fn require_valid_oracle_config(&self, config: &OracleConfig) {
        if let Err(e) = base_index(&config.decimals, &config.is_base, config.feeds.len()) {
            self.env().revert(e);
        }
    }

    fn pair_ref(&self) -> LpPairContractRef {
        let pair = self.pair.get_or_revert_with(Error::InvalidConfiguration);
        LpPairContractRef::new(self.env().clone(), pair)
    }

    fn stablecoin_ref(&self) -> StablecoinContractRef {
        let stablecoin = self.stablecoin.get_or_revert_with(Error::InvalidConfiguration);
        StablecoinContractRef::new(self.env().clone(), stablecoin)
    }
}
