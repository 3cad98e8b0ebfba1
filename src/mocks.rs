//! Test doubles for the contracts the vault engine talks to.
//!
//! - `TestToken`: CEP-18 token with a faucet mint (reward token in tests)
//! - `MockLpPair`: LP token with settable reserves and signature permits
//! - `MockPriceFeed`: settable feed round
//! - `MockPriceOracle`: fixed LP price
//! - `MockFarm`: single-depositor farm paying a reward token

use alloc::string::String;
use odra::casper_types::bytesrepr::{Bytes, ToBytes};
use odra::casper_types::{PublicKey, U256};
use odra::prelude::*;
use odra::ContractRef;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};

use crate::errors::Error;
use crate::external::{Cep18TokenContractRef, FeedRound, Reserves, WalletInfo};
use crate::ledger::TokenLedger;
use crate::timelock::now_secs;

/// Prefix of every permit message signed for `MockLpPair`
pub const PERMIT_DOMAIN: &[u8] = b"utoken-lp-permit";

/// Bytes an LP holder signs to approve `spender` for `value`.
pub fn permit_message(
    owner: &Address,
    spender: &Address,
    value: &U256,
    nonce: u64,
    deadline: u64,
) -> Bytes {
    let mut message = Vec::from(PERMIT_DOMAIN);
    let parts = [
        owner.to_bytes(),
        spender.to_bytes(),
        value.to_bytes(),
        nonce.to_bytes(),
        deadline.to_bytes(),
    ];
    for part in parts {
        message.extend(part.unwrap_or_default());
    }
    Bytes::from(message)
}

// ==========================================
// TestToken
// ==========================================

/// CEP-18 token anyone can mint
#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom
    ],
    errors = Error
)]
pub struct TestToken {
    token: SubModule<TokenLedger>,
}

#[odra::module]
impl TestToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.token.init(name, symbol, decimals);
    }

    /// Faucet mint
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.token.raw_mint(&to, &amount);
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }
}

// ==========================================
// MockLpPair
// ==========================================

/// AMM pair stand-in: a mintable LP token whose reserves are set directly
#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom
    ],
    errors = Error
)]
pub struct MockLpPair {
    token: SubModule<TokenLedger>,
    reserves: Var<Reserves>,
    nonces: Mapping<Address, u64>,
}

#[odra::module]
impl MockLpPair {
    pub fn init(&mut self, reserve0: U256, reserve1: U256) {
        self.token
            .init(String::from("uToken LP"), String::from("ULP"), 18u8);
        self.set_reserves(reserve0, reserve1);
    }

    pub fn set_reserves(&mut self, reserve0: U256, reserve1: U256) {
        self.reserves.set(Reserves {
            reserve0,
            reserve1,
            block_timestamp_last: now_secs(&self.env()),
        });
    }

    pub fn get_reserves(&self) -> Reserves {
        self.reserves.get_or_revert_with(Error::EmptyPool)
    }

    /// Faucet mint
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.token.raw_mint(&to, &amount);
    }

    pub fn burn(&mut self, from: Address, amount: U256) {
        self.token.raw_burn(&from, &amount);
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }

    pub fn nonce_of(&self, owner: Address) -> u64 {
        self.nonces.get(&owner).unwrap_or_default()
    }

    /// Approve `spender` on behalf of the holder of `owner_key`, who signed
    /// [`permit_message`] with their current nonce
    pub fn permit(
        &mut self,
        owner_key: PublicKey,
        spender: Address,
        value: U256,
        deadline: u64,
        signature: Bytes,
    ) {
        if now_secs(&self.env()) > deadline {
            self.env().revert(Error::PermitExpired);
        }
        let owner = Address::Account(owner_key.to_account_hash());
        let nonce = self.nonce_of(owner);
        let message = permit_message(&owner, &spender, &value, nonce, deadline);
        if !self
            .env()
            .verify_signature(&message, &signature, &owner_key)
        {
            self.env().revert(Error::InvalidSignature);
        }
        self.nonces.set(&owner, nonce + 1);
        self.token.raw_approve(&owner, &spender, &value);
    }
}

// ==========================================
// MockPriceFeed
// ==========================================

#[odra::module(errors = Error)]
pub struct MockPriceFeed {
    decimals: Var<u8>,
    answer: Var<U256>,
    updated_at: Var<u64>,
}

#[odra::module]
impl MockPriceFeed {
    pub fn init(&mut self, decimals: u8, answer: U256) {
        self.decimals.set(decimals);
        self.set_answer(answer);
    }

    /// Publish a new answer stamped with the current block time
    pub fn set_answer(&mut self, answer: U256) {
        self.answer.set(answer);
        self.updated_at.set(now_secs(&self.env()));
    }

    pub fn set_updated_at(&mut self, updated_at: u64) {
        self.updated_at.set(updated_at);
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    pub fn latest_round_data(&self) -> FeedRound {
        FeedRound {
            answer: self.answer.get_or_default(),
            updated_at: self.updated_at.get_or_default(),
        }
    }
}

// ==========================================
// MockPriceOracle
// ==========================================

/// Oracle answering a fixed price for any query
#[odra::module(errors = Error)]
pub struct MockPriceOracle {
    price: Var<U256>,
}

#[odra::module]
impl MockPriceOracle {
    pub fn init(&mut self, price: U256) {
        self.price.set(price);
    }

    pub fn set_price(&mut self, price: U256) {
        self.price.set(price);
    }

    #[allow(unused_variables)]
    pub fn latest_answer(
        &self,
        pair: Address,
        decimals: Bytes,
        feeds: Vec<Address>,
        is_base: Vec<bool>,
        max_percent_diff: u64,
        allowed_delay: u64,
    ) -> U256 {
        self.price.get_or_default()
    }
}

// ==========================================
// MockFarm
// ==========================================

/// Farm holding staked LP per depositor; rewards are credited with
/// `accrue` and paid from the farm's own reward-token balance
#[odra::module(errors = Error)]
pub struct MockFarm {
    lp_token: Var<Address>,
    reward_token: Var<Address>,
    staked: Mapping<Address, U256>,
    pending: Mapping<Address, U256>,
}

#[odra::module]
impl MockFarm {
    pub fn init(&mut self, lp_token: Address, reward_token: Address) {
        self.lp_token.set(lp_token);
        self.reward_token.set(reward_token);
    }

    pub fn deposit(&mut self, amount: U256) {
        let caller = self.env().caller();
        let self_address = self.env().self_address();
        self.lp_ref().transfer_from(caller, self_address, amount);
        let staked = self.staked.get(&caller).unwrap_or_default();
        self.staked.set(&caller, staked + amount);
    }

    pub fn withdraw(&mut self, amount: U256) {
        let caller = self.env().caller();
        let staked = self.staked.get(&caller).unwrap_or_default();
        if amount > staked {
            self.env().revert(Error::Underflow);
        }
        self.staked.set(&caller, staked - amount);
        self.lp_ref().transfer(caller, amount);
    }

    pub fn claim(&mut self, token: Address, to: Address) {
        let reward_token = self.reward_token.get_or_revert_with(Error::InvalidConfiguration);
        if token != reward_token {
            self.env().revert(Error::InvalidAddress);
        }
        let caller = self.env().caller();
        let pending = self.pending.get(&caller).unwrap_or_default();
        if pending.is_zero() {
            return;
        }
        self.pending.set(&caller, U256::zero());
        Cep18TokenContractRef::new(self.env().clone(), reward_token).transfer(to, pending);
    }

    /// Credit `amount` of rewards to `depositor`
    pub fn accrue(&mut self, depositor: Address, amount: U256) {
        let pending = self.pending.get(&depositor).unwrap_or_default();
        self.pending.set(&depositor, pending + amount);
    }

    pub fn get_pending_rewards(&self) -> U256 {
        self.pending.get(&self.env().caller()).unwrap_or_default()
    }

    pub fn get_wallet_info(&self) -> WalletInfo {
        WalletInfo {
            amount: self.staked.get(&self.env().caller()).unwrap_or_default(),
            reward_debt: U256::zero(),
        }
    }

    pub fn staked_of(&self, depositor: Address) -> U256 {
        self.staked.get(&depositor).unwrap_or_default()
    }

    fn lp_ref(&self) -> Cep18TokenContractRef {
        let lp_token = self.lp_token.get_or_revert_with(Error::InvalidConfiguration);
        Cep18TokenContractRef::new(self.env().clone(), lp_token)
    }
}
