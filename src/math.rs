//! Fixed-point helpers shared by the oracle and the vaults.
//!
//! ## Units
//! - Token amounts and prices: wad (U256, 18 decimals), `BASE = 1e18`
//! - LTV, CR, fees, price tolerance: `SECOND_BASE = 1e8` (1e8 = 100%)

use odra::casper_types::U256;

use crate::errors::Error;

/// 1 wad = 1e18
pub const BASE: u128 = 1_000_000_000_000_000_000;
/// Basis for LTV, CR, fee and deviation fractions
pub const SECOND_BASE: u64 = 100_000_000;
/// Decimals every amount is normalised to before pricing
pub const WAD_DECIMALS: u8 = 18;

/// `a * b / denominator`, rounding down.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, Error> {
    if denominator.is_zero() {
        return Err(Error::InvalidConfiguration);
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(Error::Overflow)
}

/// Share of `amount` for a `SECOND_BASE` fraction.
pub fn fraction_of(amount: U256, fraction: u64) -> Result<U256, Error> {
    mul_div(amount, U256::from(fraction), U256::from(SECOND_BASE))
}

/// Rescale an amount with `decimals` to 18 decimals.
pub fn normalize(amount: U256, decimals: u8) -> Result<U256, Error> {
    if decimals == WAD_DECIMALS {
        return Ok(amount);
    }
    if decimals < WAD_DECIMALS {
        let factor = pow10(WAD_DECIMALS - decimals)?;
        amount.checked_mul(factor).ok_or(Error::Overflow)
    } else {
        let factor = pow10(decimals - WAD_DECIMALS)?;
        Ok(amount / factor)
    }
}

fn pow10(exponent: u8) -> Result<U256, Error> {
    U256::from(10u64)
        .checked_pow(U256::from(exponent))
        .ok_or(Error::Overflow)
}

/// Relative distance of `value` from `reference`, in `SECOND_BASE` units.
pub fn deviation(value: U256, reference: U256) -> Result<U256, Error> {
    let diff = if value > reference {
        value - reference
    } else {
        reference - value
    };
    mul_div(diff, U256::from(SECOND_BASE), reference)
}

pub fn wad() -> U256 {
    U256::from(BASE)
}
