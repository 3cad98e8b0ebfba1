//! Livenet deploy and admin binary for the uToken protocol.
//!
//! Run with:
//! - Deploy:   UTOKEN_LIVENET_MODE=deploy cargo run --bin utoken_livenet --features=livenet
//! - Execute:  UTOKEN_LIVENET_MODE=execute UTOKEN_EXISTING_STABLECOIN=... UTOKEN_EXISTING_FACTORY=... UTOKEN_EXISTING_VAULT=... cargo run ...
//! - Query:    UTOKEN_LIVENET_MODE=query UTOKEN_EXISTING_VAULT=... cargo run ...
//!
//! `deploy` deploys the stablecoin, factory, oracle and one vault, registers
//! the vault and proposes it as factory-enabled vault and stablecoin minter.
//! `execute` completes both proposals once their timelocks elapsed (3 days
//! for the factory, 7 days for the minter). `query` prints the caller's
//! position as JSON.
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS
//! - ODRA_CASPER_LIVENET_EVENTS_URL
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Vault market (deploy mode):
//! - UTOKEN_PAIR                      LP pair address
//! - UTOKEN_STAKING_POOL              staking pool address
//! - UTOKEN_FEEDS                     comma-separated feed addresses
//! - UTOKEN_PAIR_DECIMALS             default "18,18"
//! - UTOKEN_BASE_INDEX                stablecoin side of the pair, default 0
//! - UTOKEN_MAX_PERCENT_DIFF          default 3_000_000 (3%)
//! - UTOKEN_ALLOWED_DELAY             seconds, default 3600
//! - UTOKEN_LTV / UTOKEN_CR           default 50_000_000 / 80_000_000
//! - UTOKEN_PROTOCOL_FEE / UTOKEN_STAKE_FEE   default 500_000 each
//! - UTOKEN_MINT_LIMIT                wad, default 1_000_000e18
//!
//! Optional gas overrides (motes):
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS
//! - ODRA_CASPER_LIVENET_CALL_GAS

use odra::casper_types::bytesrepr::Bytes;
use odra::casper_types::U256;
use odra::host::{Deployer, HostRef, HostRefLoader, NoArgs};
use odra::prelude::*;

use utoken_casper::factory::{VaultFactory, VaultFactoryHostRef};
use utoken_casper::oracle::LpOracle;
use utoken_casper::stablecoin::{Stablecoin, StablecoinHostRef, StablecoinInitArgs};
use utoken_casper::vault::{OracleConfig, Vault, VaultHostRef, VaultInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;

const DEFAULT_DEPLOY_GAS_MOTES: u64 = 600_000_000_000; // 600 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

const DEFAULT_MINT_LIMIT: &str = "1000000000000000000000000";

fn main() {
    println!("============================================");
    println!("  uToken Protocol - Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("UTOKEN_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let deploy_gas = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS", DEFAULT_DEPLOY_GAS_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas,
        deploy_gas / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!();

    match mode.as_str() {
        "deploy" => deploy(&env, deploy_gas, call_gas),
        "execute" => execute(&env, call_gas),
        "query" => query(&env),
        other => panic!("Unknown UTOKEN_LIVENET_MODE: {}", other),
    }
}

// ==========================================
// Deploy
// ==========================================

fn deploy(env: &odra::host::HostEnv, deploy_gas: u64, call_gas: u64) {
    let pair = parse_contract_address(&require_env("UTOKEN_PAIR"));
    let staking_pool = parse_contract_address(&require_env("UTOKEN_STAKING_POOL"));
    let oracle_config = read_oracle_config();

    println!("[STEP 1] Deploying uToken stablecoin...");
    env.set_gas(deploy_gas);
    let mut stablecoin = Stablecoin::deploy(
        env,
        StablecoinInitArgs {
            name: "uToken".to_string(),
            symbol: "UTKN".to_string(),
        },
    );
    println!("[OK] Stablecoin deployed at: {:?}", stablecoin.address());
    println!();

    println!("[STEP 2] Deploying vault factory...");
    env.set_gas(deploy_gas);
    let mut factory = VaultFactory::deploy(env, NoArgs);
    println!("[OK] Factory deployed at: {:?}", factory.address());
    println!();

    println!("[STEP 3] Deploying LP oracle...");
    env.set_gas(deploy_gas);
    let oracle = LpOracle::deploy(env, NoArgs);
    println!("[OK] Oracle deployed at: {:?}", oracle.address());
    println!();

    println!("[STEP 4] Deploying vault...");
    env.set_gas(deploy_gas);
    let vault = Vault::deploy(
        env,
        VaultInitArgs {
            factory: factory.address(),
            pair,
            stablecoin: stablecoin.address(),
            staking_pool,
            oracle: oracle.address(),
            oracle_config,
            ltv: read_u64_env("UTOKEN_LTV", 50_000_000),
            cr: read_u64_env("UTOKEN_CR", 80_000_000),
            protocol_fee: read_u64_env("UTOKEN_PROTOCOL_FEE", 500_000),
            stake_fee: read_u64_env("UTOKEN_STAKE_FEE", 500_000),
            mint_limit: read_u256_env("UTOKEN_MINT_LIMIT", DEFAULT_MINT_LIMIT),
        },
    );
    println!("[OK] Vault deployed at: {:?}", vault.address());
    println!("     LTV: {}", vault.ltv());
    println!("     CR: {}", vault.cr());
    println!("     Mint limit: {}", vault.mint_limit());
    println!();

    println!("[STEP 5] Registering vault and proposing it...");
    env.set_gas(call_gas);
    factory.register_vault(vault.address());
    env.set_gas(call_gas);
    factory.enable_vault(vault.address());
    env.set_gas(call_gas);
    stablecoin.add_minter(vault.address());
    println!("[OK] Vault registered at index {}", factory.vault_count() - 1);
    println!("[INFO] Run with UTOKEN_LIVENET_MODE=execute once the timelocks elapsed.");
    println!();

    output_deploy_json(
        stablecoin.address(),
        factory.address(),
        oracle.address(),
        vault.address(),
    );
}

// ==========================================
// Execute
// ==========================================

fn execute(env: &odra::host::HostEnv, call_gas: u64) {
    let mut stablecoin = load_stablecoin(env);
    let mut factory = load_factory(env);
    let vault = load_vault(env);
    let vault_addr = vault.address();

    println!("[STEP 1] Enabling vault on the factory...");
    if factory.is_allowed(vault_addr) {
        println!("[OK] Vault already enabled.");
    } else {
        env.set_gas(call_gas);
        factory.execute_enable_vault(vault_addr);
        println!("[OK] Vault enabled.");
    }
    println!();

    println!("[STEP 2] Enabling vault as minter...");
    if stablecoin.is_minter(vault_addr) {
        println!("[OK] Vault already a minter.");
    } else {
        env.set_gas(call_gas);
        stablecoin.enable_minter(vault_addr);
        println!("[OK] Minter enabled.");
    }
    println!();
}

// ==========================================
// Query
// ==========================================

fn query(env: &odra::host::HostEnv) {
    let vault = load_vault(env);
    let user = env.caller();
    let position = vault.position(user);

    println!(
        "UTOKEN_POSITION_JSON={{\"collateral\":\"{}\",\"debt\":\"{}\",\"collateral_value\":\"{}\",\"current_ltv\":{},\"yield_wallet_deposit\":\"{}\",\"vault_minted\":\"{}\",\"mint_limit\":\"{}\",\"user\":\"{:?}\"}}",
        position.collateral,
        position.debt,
        position.collateral_value,
        position.current_ltv,
        position.yield_wallet_deposit,
        vault.minted(),
        vault.mint_limit(),
        user
    );
}

// ==========================================
// Helpers
// ==========================================

fn load_stablecoin(env: &odra::host::HostEnv) -> StablecoinHostRef {
    let addr = parse_contract_address(&require_env("UTOKEN_EXISTING_STABLECOIN"));
    println!("[INFO] Stablecoin: {:?}", addr);
    Stablecoin::load(env, addr)
}

fn load_factory(env: &odra::host::HostEnv) -> VaultFactoryHostRef {
    let addr = parse_contract_address(&require_env("UTOKEN_EXISTING_FACTORY"));
    println!("[INFO] Factory: {:?}", addr);
    VaultFactory::load(env, addr)
}

fn load_vault(env: &odra::host::HostEnv) -> VaultHostRef {
    let addr = parse_contract_address(&require_env("UTOKEN_EXISTING_VAULT"));
    println!("[INFO] Vault: {:?}", addr);
    Vault::load(env, addr)
}

fn read_oracle_config() -> OracleConfig {
    let feeds: Vec<Address> = require_env("UTOKEN_FEEDS")
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_contract_address)
        .collect();
    let decimals: Bytes = std::env::var("UTOKEN_PAIR_DECIMALS")
        .unwrap_or_else(|_| "18,18".to_string())
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<u8>()
                .unwrap_or_else(|_| panic!("Invalid UTOKEN_PAIR_DECIMALS entry: {}", s))
        })
        .collect::<Vec<u8>>()
        .into();
    let base_index = read_u64_env("UTOKEN_BASE_INDEX", 0);
    OracleConfig {
        decimals,
        feeds,
        is_base: vec![base_index == 0, base_index == 1],
        max_percent_diff: read_u64_env("UTOKEN_MAX_PERCENT_DIFF", 3_000_000),
        allowed_delay: read_u64_env("UTOKEN_ALLOWED_DELAY", 3_600),
    }
}

fn require_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{} must be set", name))
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn read_u256_env(name: &str, default_value: &str) -> U256 {
    let raw = std::env::var(name).unwrap_or_else(|_| default_value.to_string());
    let cleaned = raw.trim().replace('_', "");
    U256::from_dec_str(&cleaned).unwrap_or_else(|_| panic!("Invalid {}: {}", name, raw))
}

fn output_deploy_json(stablecoin: Address, factory: Address, oracle: Address, vault: Address) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    println!(
        r#"UTOKEN_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","stablecoin":"{}","factory":"{}","oracle":"{}","vault":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        format_address_hash(&stablecoin),
        format_address_hash(&factory),
        format_address_hash(&oracle),
        format_address_hash(&vault),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    match (debug_str.find('['), debug_str.rfind(']')) {
        (Some(start), Some(end)) if start < end => debug_str[start + 1..end]
            .split(", ")
            .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
            .collect(),
        _ => debug_str,
    }
}

/// Parse `account-hash-`, `contract-package-`, `package-`, `hash-` or bare
/// 64-hex addresses; bare hashes are treated as contract packages.
fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    let hex = ["contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    Address::Contract(ContractPackageHash::new(decode_hex_32(hex)))
}
