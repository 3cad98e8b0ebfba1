//! Build contract binary for Odra WASM generation
//!
//! Compiled to WASM; pulls in the contract entry points.

#![cfg_attr(target_arch = "wasm32", no_std)]
#![cfg_attr(target_arch = "wasm32", no_main)]

#[cfg(target_arch = "wasm32")]
extern crate odra_casper_wasm_env;

#[cfg(target_arch = "wasm32")]
use odra_casper_wasm_env as _;
#[cfg(target_arch = "wasm32")]
use utoken_casper::factory::VaultFactory;
#[cfg(target_arch = "wasm32")]
use utoken_casper::oracle::LpOracle;
#[cfg(target_arch = "wasm32")]
use utoken_casper::stablecoin::Stablecoin;
#[cfg(target_arch = "wasm32")]
use utoken_casper::vault::Vault;
#[cfg(target_arch = "wasm32")]
use utoken_casper::yield_wallet::YieldWalletRegistry;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    panic!("utoken_casper_build_contract is intended to be built for wasm32-unknown-unknown only");
}
