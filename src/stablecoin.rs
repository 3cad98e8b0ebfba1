//! uToken: the protocol stablecoin.
//!
//! - CEP-18 ledger (balances, allowances, total supply)
//! - Minting and burning restricted to timelocked minters (vaults)
//! - Minters are proposed with `add_minter` and become active through
//!   `enable_minter` no earlier than 7 days later
//! - Two-step governance handover

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};

use crate::address::is_zero_address;
use crate::errors::Error;
use crate::governance::events::{GovernanceAccepted, GovernanceProposed};
use crate::governance::Governance;
use crate::ledger::TokenLedger;
use crate::timelock::{now_secs, Timelock, MINTER_TIMELOCK};

pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct MinterProposed {
        pub minter: Address,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct MinterEnabled {
        pub minter: Address,
    }

    #[odra::event]
    pub struct MinterRemoved {
        pub minter: Address,
    }
}

#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom,
        events::MinterProposed,
        events::MinterEnabled,
        events::MinterRemoved,
        GovernanceProposed,
        GovernanceAccepted
    ],
    errors = Error
)]
pub struct Stablecoin {
    token: SubModule<TokenLedger>,
    governance: SubModule<Governance>,
    minters: Mapping<Address, Timelock>,
}

#[odra::module]
impl Stablecoin {
    /// Initialize the token; the deployer becomes governance
    pub fn init(&mut self, name: String, symbol: String) {
        self.token.init(name, symbol, 18u8);
        let caller = self.env().caller();
        self.governance.init(caller);
    }

    // ==========================================
    // CEP-18
    // ==========================================

    pub fn name(&self) -> String {
        self.token.name()
    }

    pub fn symbol(&self) -> String {
        self.token.symbol()
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

    pub fn increase_allowance(&mut self, spender: Address, amount: U256) {
        self.token.increase_allowance(&spender, &amount);
    }

    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) {
        self.token.decrease_allowance(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }

    // ==========================================
    // Minting
    // ==========================================

    /// Mint tokens (active minters only)
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.require_minter();
        self.token.raw_mint(&to, &amount);
    }

    /// Burn tokens held by `from` (active minters only)
    pub fn burn(&mut self, from: Address, amount: U256) {
        self.require_minter();
        self.token.raw_burn(&from, &amount);
    }

    /// Propose a minter; it can be enabled after the minter timelock
    pub fn add_minter(&mut self, minter: Address) {
        self.governance.assert_governance();
        if is_zero_address(&minter) {
            self.env().revert(Error::InvalidAddress);
        }
        let now = now_secs(&self.env());
        let next = self
            .minter_timelock(minter)
            .propose_enable(now)
            .unwrap_or_else(|e| self.env().revert(e));
        self.minters.set(&minter, next);
        self.env().emit_event(events::MinterProposed {
            minter,
            proposed_at: now,
        });
    }

    /// Activate a proposed minter once the timelock elapsed
    pub fn enable_minter(&mut self, minter: Address) {
        self.governance.assert_governance();
        let next = self
            .minter_timelock(minter)
            .execute_enable(now_secs(&self.env()), MINTER_TIMELOCK)
            .unwrap_or_else(|e| self.env().revert(e));
        self.minters.set(&minter, next);
        self.env().emit_event(events::MinterEnabled { minter });
    }

    /// Remove a minter (or a pending proposal) immediately
    pub fn remove_minter(&mut self, minter: Address) {
        self.governance.assert_governance();
        let next = self.minter_timelock(minter).revoke();
        self.minters.set(&minter, next);
        self.env().emit_event(events::MinterRemoved { minter });
    }

    pub fn is_minter(&self, account: Address) -> bool {
        self.minter_timelock(account).is_active()
    }

    pub fn minter_timelock(&self, account: Address) -> Timelock {
        self.minters.get(&account).unwrap_or_default()
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

    fn require_minter(&self) {
        if !self.is_minter(self.env().caller()) {
            self.env().revert(Error::Unauthorized);
        }
    }
}
