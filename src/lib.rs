//! uToken x Casper: LP-collateralised stablecoin (Odra)
//!
//! - Stablecoin: uToken, mintable only by timelocked minters
//! - VaultFactory: vault registry with a timelocked allow-list
//! - Vault: locks AMM LP tokens and mints uToken against them
//! - LpOracle: manipulation-resistant LP pricing from reserves and feeds
//! - YieldWalletRegistry: per-user farm staking of locked collateral

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod address;
pub mod errors;
pub mod external;
pub mod factory;
pub mod governance;
pub mod ledger;
pub mod math;
pub mod mocks;
pub mod oracle;
pub mod stablecoin;
pub mod timelock;
pub mod vault;
pub mod yield_wallet;
