//! Address helpers.
//!
//! Casper has no native zero address. The all-zero account hash and the
//! all-zero contract package hash play that role for integrators porting
//! calls from other chains, and both are rejected wherever a real
//! counterparty is required.

use odra::casper_types::account::AccountHash;
use odra::casper_types::contracts::ContractPackageHash;
use odra::prelude::*;

/// The all-zero account address.
pub fn zero_address() -> Address {
    Address::Account(AccountHash::new([0u8; 32]))
}

pub fn is_zero_address(address: &Address) -> bool {
    *address == zero_address() || *address == Address::Contract(ContractPackageHash::new([0u8; 32]))
}
