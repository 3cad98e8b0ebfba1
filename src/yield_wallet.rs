//! Yield wallet registry.
//!
//! One registry serves one farm for one LP token. Each user of a vault gets
//! a wallet id here; the vault deposits the user's collateral into that
//! wallet and the registry stakes it in the farm on the wallet's behalf.
//!
//! Farm rewards are harvested into the registry and shared between wallets
//! by stake with an accumulated reward-per-share index:
//!
//! ```text
//! acc_reward_per_share += harvested * ACC_PRECISION / total_deposited
//! pending(wallet)       = amount * acc_reward_per_share / ACC_PRECISION
//!                         - reward_debt + unclaimed
//! ```
//!
//! Only the vault that created a wallet may move its stake or claim for it.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::address::is_zero_address;
use crate::errors::Error;
use crate::external::{Cep18TokenContractRef, FarmAdapterContractRef, WalletInfo};

/// Precision of the reward-per-share index
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct YieldWalletOpened {
        pub wallet_id: u32,
        pub owner: Address,
        pub vault: Address,
    }

    #[odra::event]
    pub struct Deposited {
        pub wallet_id: u32,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Withdrawn {
        pub wallet_id: u32,
        pub amount: U256,
    }

    #[odra::event]
    pub struct RewardsHarvested {
        pub amount: U256,
        pub acc_reward_per_share: U256,
    }

    #[odra::event]
    pub struct RewardsPaid {
        pub wallet_id: u32,
        pub to: Address,
        pub amount: U256,
    }
}

#[odra::odra_type]
pub struct WalletRecord {
    pub owner: Address,
    /// Vault allowed to operate the wallet
    pub vault: Address,
    pub amount: U256,
    pub reward_debt: U256,
    pub unclaimed: U256,
}

impl WalletRecord {
    fn accrued(&self, acc_reward_per_share: U256) -> Result<U256, Error> {
        let earned = accumulated(self.amount, acc_reward_per_share)?;
        earned
            .checked_sub(self.reward_debt)
            .and_then(|fresh| fresh.checked_add(self.unclaimed))
            .ok_or(Error::Underflow)
    }

    /// Move everything earned so far into `unclaimed` and rebase the debt
    fn settle(&mut self, acc_reward_per_share: U256) -> Result<(), Error> {
        self.unclaimed = self.accrued(acc_reward_per_share)?;
        self.reward_debt = accumulated(self.amount, acc_reward_per_share)?;
        Ok(())
    }
}

fn accumulated(amount: U256, acc_reward_per_share: U256) -> Result<U256, Error> {
    amount
        .checked_mul(acc_reward_per_share)
        .map(|v| v / U256::from(ACC_PRECISION))
        .ok_or(Error::Overflow)
}

/// New reward-per-share index after harvesting `harvested` over `total`.
pub fn next_acc_reward_per_share(
    acc_reward_per_share: U256,
    harvested: U256,
    total: U256,
) -> Result<U256, Error> {
    if total.is_zero() || harvested.is_zero() {
        return Ok(acc_reward_per_share);
    }
    let increment = harvested
        .checked_mul(U256::from(ACC_PRECISION))
        .map(|v| v / total)
        .ok_or(Error::Overflow)?;
    acc_reward_per_share
        .checked_add(increment)
        .ok_or(Error::Overflow)
}

#[odra::module(
    events = [
        events::YieldWalletOpened,
        events::Deposited,
        events::Withdrawn,
        events::RewardsHarvested,
        events::RewardsPaid
    ],
    errors = Error
)]
pub struct YieldWalletRegistry {
    lp_token: Var<Address>,
    farm: Var<Address>,
    reward_token: Var<Address>,
    wallets: Mapping<u32, WalletRecord>,
    wallet_count: Var<u32>,
    total_deposited: Var<U256>,
    acc_reward_per_share: Var<U256>,
}

#[odra::module]
impl YieldWalletRegistry {
    pub fn init(&mut self, lp_token: Address, farm: Address, reward_token: Address) {
        for address in [&lp_token, &farm, &reward_token] {
            if is_zero_address(address) {
                self.env().revert(Error::InvalidAddress);
            }
        }
        self.lp_token.set(lp_token);
        self.farm.set(farm);
        self.reward_token.set(reward_token);
        self.wallet_count.set(0);
        self.total_deposited.set(U256::zero());
        self.acc_reward_per_share.set(U256::zero());
    }

    /// Open a wallet for `owner`, operated by the calling vault
    pub fn create_yield_wallet(&mut self, owner: Address) -> u32 {
        if is_zero_address(&owner) {
            self.env().revert(Error::InvalidAddress);
        }
        let vault = self.env().caller();
        let wallet_id = self.wallet_count.get_or_default();
        self.wallets.set(
            &wallet_id,
            WalletRecord {
                owner,
                vault,
                amount: U256::zero(),
                reward_debt: U256::zero(),
                unclaimed: U256::zero(),
            },
        );
        self.wallet_count.set(wallet_id + 1);
        self.env().emit_event(events::YieldWalletOpened {
            wallet_id,
            owner,
            vault,
        });
        wallet_id
    }

    /// Stake `amount` LP tokens, already transferred here by the vault
    pub fn deposit(&mut self, wallet_id: u32, amount: U256) {
        if amount.is_zero() {
            self.env().revert(Error::ZeroAmount);
        }
        let mut wallet = self.operated_wallet(wallet_id);
        let acc = self.harvest();
        wallet.settle(acc).unwrap_or_else(|e| self.env().revert(e));
        wallet.amount += amount;
        wallet.reward_debt = accumulated(wallet.amount, acc).unwrap_or_else(|e| self.env().revert(e));
        self.wallets.set(&wallet_id, wallet);
        let total = self.total_deposited.get_or_default();
        self.total_deposited.set(total + amount);

        let farm = self.farm.get_or_revert_with(Error::InvalidConfiguration);
        self.lp_ref().approve(farm, amount);
        FarmAdapterContractRef::new(self.env().clone(), farm).deposit(amount);

        self.env()
            .emit_event(events::Deposited { wallet_id, amount });
    }

    /// Unstake `amount` LP tokens and send them back to the vault
    pub fn withdraw(&mut self, wallet_id: u32, amount: U256) {
        if amount.is_zero() {
            self.env().revert(Error::ZeroAmount);
        }
        let mut wallet = self.operated_wallet(wallet_id);
        if amount > wallet.amount {
            self.env().revert(Error::Underflow);
        }
        let acc = self.harvest();
        wallet.settle(acc).unwrap_or_else(|e| self.env().revert(e));
        wallet.amount -= amount;
        wallet.reward_debt = accumulated(wallet.amount, acc).unwrap_or_else(|e| self.env().revert(e));
        let vault = wallet.vault;
        self.wallets.set(&wallet_id, wallet);
        let total = self.total_deposited.get_or_default();
        self.total_deposited.set(total - amount);

        let farm = self.farm.get_or_revert_with(Error::InvalidConfiguration);
        FarmAdapterContractRef::new(self.env().clone(), farm).withdraw(amount);
        self.lp_ref().transfer(vault, amount);

        self.env()
            .emit_event(events::Withdrawn { wallet_id, amount });
    }

    /// Pay out the wallet's rewards in `token` to `to`
    pub fn claim(&mut self, wallet_id: u32, token: Address, to: Address) {
        let reward_token = self.reward_token.get_or_revert_with(Error::InvalidConfiguration);
        if token != reward_token {
            self.env().revert(Error::InvalidAddress);
        }
        let mut wallet = self.operated_wallet(wallet_id);
        let acc = self.harvest();
        wallet.settle(acc).unwrap_or_else(|e| self.env().revert(e));
        let amount = wallet.unclaimed;
        wallet.unclaimed = U256::zero();
        self.wallets.set(&wallet_id, wallet);

        if !amount.is_zero() {
            Cep18TokenContractRef::new(self.env().clone(), reward_token).transfer(to, amount);
        }
        self.env().emit_event(events::RewardsPaid {
            wallet_id,
            to,
            amount,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Rewards claimable by the wallet, including what the farm holds
    pub fn pending_rewards(&self, wallet_id: u32) -> U256 {
        let wallet = self.wallet(wallet_id);
        let total = self.total_deposited.get_or_default();
        let farm_pending = if total.is_zero() {
            U256::zero()
        } else {
            let farm = self.farm.get_or_revert_with(Error::InvalidConfiguration);
            FarmAdapterContractRef::new(self.env().clone(), farm).get_pending_rewards()
        };
        next_acc_reward_per_share(self.acc_reward_per_share.get_or_default(), farm_pending, total)
            .and_then(|acc| wallet.accrued(acc))
            .unwrap_or_else(|e| self.env().revert(e))
    }

    pub fn wallet_info(&self, wallet_id: u32) -> WalletInfo {
        let wallet = self.wallet(wallet_id);
        WalletInfo {
            amount: wallet.amount,
            reward_debt: wallet.reward_debt,
        }
    }

    pub fn wallet_count(&self) -> u32 {
        self.wallet_count.get_or_default()
    }

    pub fn owner_of(&self, wallet_id: u32) -> Option<Address> {
        self.wallets.get(&wallet_id).map(|wallet| wallet.owner)
    }

    pub fn total_deposited(&self) -> U256 {
        self.total_deposited.get_or_default()
    }

    pub fn acc_reward_per_share(&self) -> U256 {
        self.acc_reward_per_share.get_or_default()
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn wallet(&self, wallet_id: u32) -> WalletRecord {
        self.wallets
            .get(&wallet_id)
            .unwrap_or_else(|| self.env().revert(Error::NoYieldWallet))
    }

    fn operated_wallet(&self, wallet_id: u32) -> WalletRecord {
        let wallet = self.wallet(wallet_id);
        if wallet.vault != self.env().caller() {
            self.env().revert(Error::Unauthorized);
        }
        wallet
    }

    /// Claim farm rewards into the registry and fold them into the index
    fn harvest(&mut self) -> U256 {
        let acc = self.acc_reward_per_share.get_or_default();
        let total = self.total_deposited.get_or_default();
        if total.is_zero() {
            return acc;
        }
        let self_address = self.env().self_address();
        let reward_token = self.reward_token.get_or_revert_with(Error::InvalidConfiguration);
        let farm = self.farm.get_or_revert_with(Error::InvalidConfiguration);
        let reward_ref = Cep18TokenContractRef::new(self.env().clone(), reward_token);

        let before = reward_ref.balance_of(self_address);
        FarmAdapterContractRef::new(self.env().clone(), farm).claim(reward_token, self_address);
        let harvested = reward_ref.balance_of(self_address).saturating_sub(before);
        if harvested.is_zero() {
            return acc;
        }

        let next = next_acc_reward_per_share(acc, harvested, total)
            .unwrap_or_else(|e| self.env().revert(e));
        self.acc_reward_per_share.set(next);
        self.env().emit_event(events::RewardsHarvested {
            amount: harvested,
            acc_reward_per_share: next,
        });
        next
    }

    fn lp_ref(&self) -> Cep18TokenContractRef {
        let lp_token = self.lp_token.get_or_revert_with(Error::InvalidConfiguration);
        Cep18TokenContractRef::new(self.env().clone(), lp_token)
    }
}
