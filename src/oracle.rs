//! LP collateral oracle.
//!
//! Prices one unit of an AMM LP token in stablecoin terms from the pool's
//! current reserves, guarded against single-transaction reserve
//! manipulation by a deviation check against external price feeds.
//!
//! 1. Normalise both reserves to 18 decimals.
//! 2. Chain the feed answers into the USD price of the non-base token and
//!    reject stale rounds.
//! 3. Compare the AMM-implied price `reserve_base / reserve_other` with the
//!    feed price; reject if they differ by more than `max_percent_diff`.
//! 4. Fair LP price = `2 * reserve_base * 1e18 / total_supply` (both sides of
//!    a constant-product pool hold equal value at equilibrium).

use odra::casper_types::bytesrepr::Bytes;
use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::errors::Error;
use crate::external::{LpPairContractRef, PriceFeedContractRef};
use crate::math::{deviation, mul_div, normalize, wad};
use crate::timelock::now_secs;

/// One feed reading, as consumed by [`feed_price`]
pub struct FeedReading {
    pub answer: U256,
    pub decimals: u8,
    pub updated_at: u64,
}

/// Pool state, as consumed by [`fair_lp_price`]
pub struct PoolSnapshot {
    pub reserves: [U256; 2],
    pub decimals: [u8; 2],
    pub total_supply: U256,
    /// Index of the stablecoin side of the pair
    pub base_index: usize,
}

/// Index of the single base token, validating the oracle query shape.
pub fn base_index(decimals: &[u8], is_base: &[bool], feed_count: usize) -> Result<usize, Error> {
    if decimals.len() != 2 || is_base.len() != 2 || feed_count == 0 {
        return Err(Error::InvalidConfiguration);
    }
    match (is_base[0], is_base[1]) {
        (true, false) => Ok(0),
        (false, true) => Ok(1),
        _ => Err(Error::InvalidConfiguration),
    }
}

/// Chained feed price of the non-base token, 18 decimals.
pub fn feed_price(readings: &[FeedReading], now: u64, allowed_delay: u64) -> Result<U256, Error> {
    if readings.is_empty() {
        return Err(Error::InvalidConfiguration);
    }
    let mut price = wad();
    for reading in readings {
        if reading.answer.is_zero() || reading.updated_at > now {
            return Err(Error::StalePrice);
        }
        if now - reading.updated_at > allowed_delay {
            return Err(Error::StalePrice);
        }
        let answer = normalize(reading.answer, reading.decimals)?;
        price = mul_div(price, answer, wad())?;
    }
    // Dust answers can chain down to nothing
    if price.is_zero() {
        return Err(Error::StalePrice);
    }
    Ok(price)
}

/// AMM-implied price of the non-base token, 18 decimals.
pub fn amm_price(pool: &PoolSnapshot) -> Result<U256, Error> {
    let (base, other) = normalized_reserves(pool)?;
    mul_div(base, wad(), other)
}

/// Fair value of 1e18 LP units after checking the pool against the feed.
pub fn fair_lp_price(pool: &PoolSnapshot, feed: U256, max_percent_diff: u64) -> Result<U256, Error> {
    if pool.total_supply.is_zero() {
        return Err(Error::EmptyPool);
    }
    let implied = amm_price(pool)?;
    if deviation(implied, feed)? > U256::from(max_percent_diff) {
        return Err(Error::PriceDeviation);
    }
    let (base, _) = normalized_reserves(pool)?;
    let pool_value = base.checked_mul(U256::from(2u8)).ok_or(Error::Overflow)?;
    mul_div(pool_value, wad(), pool.total_supply)
}

fn normalized_reserves(pool: &PoolSnapshot) -> Result<(U256, U256), Error> {
    let other_index = 1 - pool.base_index;
    let base = normalize(pool.reserves[pool.base_index], pool.decimals[pool.base_index])?;
    let other = normalize(pool.reserves[other_index], pool.decimals[other_index])?;
    if base.is_zero() || other.is_zero() {
        return Err(Error::EmptyPool);
    }
    Ok((base, other))
}

/// Stateless LP oracle contract
#[odra::module(errors = Error)]
pub struct LpOracle {}

#[odra::module]
impl LpOracle {
    /// Fair price of 1e18 units of `pair`, 18 decimals.
    ///
    /// `decimals[i]` and `is_base[i]` describe the pair's token `i`;
    /// `feeds` are chained to price the non-base token.
    /// `max_percent_diff` uses the 1e8 basis; `allowed_delay` is in seconds.
    pub fn latest_answer(
        &self,
        pair: Address,
        decimals: Bytes,
        feeds: Vec<Address>,
        is_base: Vec<bool>,
        max_percent_diff: u64,
        allowed_delay: u64,
    ) -> U256 {
        let base_index = base_index(&decimals, &is_base, feeds.len())
            .unwrap_or_else(|e| self.env().revert(e));

        let pair_ref = LpPairContractRef::new(self.env().clone(), pair);
        let reserves = pair_ref.get_reserves();
        let pool = PoolSnapshot {
            reserves: [reserves.reserve0, reserves.reserve1],
            decimals: [decimals[0], decimals[1]],
            total_supply: pair_ref.total_supply(),
            base_index,
        };

        let readings: Vec<FeedReading> = feeds
            .iter()
            .map(|feed| {
                let feed_ref = PriceFeedContractRef::new(self.env().clone(), *feed);
                let round = feed_ref.latest_round_data();
                FeedReading {
                    answer: round.answer,
                    decimals: feed_ref.decimals(),
                    updated_at: round.updated_at,
                }
            })
            .collect();

        feed_price(&readings, now_secs(&self.env()), allowed_delay)
            .and_then(|feed| fair_lp_price(&pool, feed, max_percent_diff))
            .unwrap_or_else(|e| self.env().revert(e))
    }
}
