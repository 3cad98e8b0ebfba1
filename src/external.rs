//! External contract interfaces consumed by the vault engine.
//!
//! - `LpPair`: AMM pair / LP token (CEP-18 + reserves + permit)
//! - `PriceFeed`: external price source for the non-stable pool side
//! - `PriceOracle`: LP collateral pricing (implemented by `LpOracle`)
//! - `YieldWalletFactory`: per-user yield wallets (implemented by
//!   `YieldWalletRegistry`)
//! - `FarmAdapter`: per-farm deposit/withdraw/claim shim
//! - `Cep18Token`: plain token, used for reward tokens

use odra::casper_types::bytesrepr::Bytes;
use odra::casper_types::{PublicKey, U256};
use odra::prelude::*;

/// Pool reserves as reported by the pair
#[odra::odra_type]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
    pub block_timestamp_last: u64,
}

/// Latest feed round; `updated_at` is in seconds
#[odra::odra_type]
pub struct FeedRound {
    pub answer: U256,
    pub updated_at: u64,
}

/// Farm-side position of a wallet
#[odra::odra_type]
pub struct WalletInfo {
    pub amount: U256,
    pub reward_debt: U256,
}

#[odra::external_contract]
pub trait LpPair {
    fn total_supply(&self) -> U256;
    fn balance_of(&self, owner: Address) -> U256;
    fn get_reserves(&self) -> Reserves;
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn approve(&mut self, spender: Address, amount: U256);
    /// Signature-based approval of `spender` by the holder of `owner_key`
    fn permit(
        &mut self,
        owner_key: PublicKey,
        spender: Address,
        value: U256,
        deadline: u64,
        signature: Bytes,
    );
}

#[odra::external_contract]
pub trait PriceFeed {
    fn decimals(&self) -> u8;
    fn latest_round_data(&self) -> FeedRound;
}

#[odra::external_contract]
pub trait PriceOracle {
    /// Price of 1e18 LP units, 18 decimals
    fn latest_answer(
        &self,
        pair: Address,
        decimals: Bytes,
        feeds: Vec<Address>,
        is_base: Vec<bool>,
        max_percent_diff: u64,
        allowed_delay: u64,
    ) -> U256;
}

#[odra::external_contract]
pub trait YieldWalletFactory {
    fn create_yield_wallet(&mut self, owner: Address) -> u32;
    fn deposit(&mut self, wallet_id: u32, amount: U256);
    fn withdraw(&mut self, wallet_id: u32, amount: U256);
    fn claim(&mut self, wallet_id: u32, token: Address, to: Address);
    fn pending_rewards(&self, wallet_id: u32) -> U256;
    fn wallet_info(&self, wallet_id: u32) -> WalletInfo;
}

#[odra::external_contract]
pub trait FarmAdapter {
    fn deposit(&mut self, amount: U256);
    fn withdraw(&mut self, amount: U256);
    fn claim(&mut self, token: Address, to: Address);
    fn get_pending_rewards(&self) -> U256;
    fn get_wallet_info(&self) -> WalletInfo;
}

#[odra::external_contract]
pub trait Cep18Token {
    fn balance_of(&self, owner: Address) -> U256;
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn approve(&mut self, spender: Address, amount: U256);
}
