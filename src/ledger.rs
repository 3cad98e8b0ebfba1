//! CEP-18 balance/allowance bookkeeping shared by the stablecoin and the
//! in-crate test tokens.
//!
//! Storage comes from `odra_modules::cep18::storage`; the transfer rules are
//! implemented here so every failure reverts with the protocol [`Error`]
//! codes instead of the CEP-18 module's own.

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18::storage::{
    Cep18AllowancesStorage, Cep18BalancesStorage, Cep18DecimalsStorage, Cep18NameStorage,
    Cep18SymbolStorage, Cep18TotalSupplyStorage,
};

use crate::address::is_zero_address;
use crate::errors::Error;

#[odra::module(errors = Error)]
pub struct TokenLedger {
    name: SubModule<Cep18NameStorage>,
    symbol: SubModule<Cep18SymbolStorage>,
    decimals: SubModule<Cep18DecimalsStorage>,
    total_supply: SubModule<Cep18TotalSupplyStorage>,
    balances: SubModule<Cep18BalancesStorage>,
    allowances: SubModule<Cep18AllowancesStorage>,
}

#[odra::module]
impl TokenLedger {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.allowances.init();
        self.balances.init();
    }

    pub fn name(&self) -> String {
        self.name.get()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get()
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances.get_or_default(owner, spender)
    }

    pub fn transfer(&mut self, recipient: &Address, amount: &U256) {
        let sender = self.env().caller();
        if sender == *recipient {
            self.env().revert(Error::CannotTargetSelfUser);
        }
        self.raw_transfer(&sender, recipient, amount);
        self.env().emit_event(Transfer {
            sender,
            recipient: *recipient,
            amount: *amount,
        });
    }

    pub fn approve(&mut self, spender: &Address, amount: &U256) {
        let owner = self.env().caller();
        self.raw_approve(&owner, spender, amount);
    }

    pub fn increase_allowance(&mut self, spender: &Address, amount: &U256) {
        let owner = self.env().caller();
        if owner == *spender {
            self.env().revert(Error::CannotTargetSelfUser);
        }
        let allowance = self.allowances.get_or_default(&owner, spender);
        let new_allowance = allowance.saturating_add(*amount);
        self.allowances.set(&owner, spender, new_allowance);
        self.env().emit_event(IncreaseAllowance {
            owner,
            spender: *spender,
            allowance: new_allowance,
            inc_by: *amount,
        });
    }

    pub fn decrease_allowance(&mut self, spender: &Address, amount: &U256) {
        let owner = self.env().caller();
        if owner == *spender {
            self.env().revert(Error::CannotTargetSelfUser);
        }
        let allowance = self.allowances.get_or_default(&owner, spender);
        let new_allowance = allowance.saturating_sub(*amount);
        self.allowances.set(&owner, spender, new_allowance);
        self.env().emit_event(DecreaseAllowance {
            owner,
            spender: *spender,
            allowance: new_allowance,
            decr_by: *amount,
        });
    }

    pub fn transfer_from(&mut self, owner: &Address, recipient: &Address, amount: &U256) {
        if owner == recipient {
            self.env().revert(Error::CannotTargetSelfUser);
        }
        if amount.is_zero() {
            return;
        }
        let spender = self.env().caller();
        let allowance = self.allowances.get_or_default(owner, &spender);
        if allowance < *amount {
            self.env().revert(Error::InsufficientAllowance);
        }
        self.allowances.set(owner, &spender, allowance - *amount);
        self.raw_transfer(owner, recipient, amount);
        self.env().emit_event(TransferFrom {
            spender,
            owner: *owner,
            recipient: *recipient,
            amount: *amount,
        });
    }

    /// Set an allowance on behalf of `owner`; the caller is responsible for
    /// having authenticated the owner.
    pub fn raw_approve(&mut self, owner: &Address, spender: &Address, amount: &U256) {
        if owner == spender {
            self.env().revert(Error::CannotTargetSelfUser);
        }
        self.allowances.set(owner, spender, *amount);
        self.env().emit_event(SetAllowance {
            owner: *owner,
            spender: *spender,
            allowance: *amount,
        });
    }

    pub fn raw_transfer(&mut self, sender: &Address, recipient: &Address, amount: &U256) {
        let balance = self.balances.get(sender).unwrap_or_default();
        if balance < *amount {
            self.env().revert(Error::InsufficientBalance);
        }
        if !amount.is_zero() {
            self.balances.subtract(sender, *amount);
            self.balances.add(recipient, *amount);
        }
    }

    pub fn raw_mint(&mut self, owner: &Address, amount: &U256) {
        if is_zero_address(owner) {
            self.env().revert(Error::InvalidAddress);
        }
        self.total_supply.add(*amount);
        self.balances.add(owner, *amount);
        self.env().emit_event(Mint {
            recipient: *owner,
            amount: *amount,
        });
    }

    pub fn raw_burn(&mut self, owner: &Address, amount: &U256) {
        let balance = self.balances.get(owner).unwrap_or_default();
        if balance < *amount {
            self.env().revert(Error::InsufficientBalance);
        }
        self.balances.subtract(owner, *amount);
        self.total_supply.subtract(*amount);
        self.env().emit_event(Burn {
            owner: *owner,
            amount: *amount,
        });
    }
}
