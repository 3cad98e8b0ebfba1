//! Vault registry.
//!
//! Vaults are deployed by the operator and registered here, which assigns
//! them an index. A registered vault may only lock collateral (and so mint
//! uToken) while the factory's allow-list entry for it is active; enabling
//! and disabling both go through a 3-day timelock.

use odra::prelude::*;

use crate::address::is_zero_address;
use crate::errors::Error;
use crate::governance::events::{GovernanceAccepted, GovernanceProposed};
use crate::governance::Governance;
use crate::timelock::{now_secs, Timelock, VAULT_TIMELOCK};

pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct VaultRegistered {
        pub vault: Address,
        pub index: u32,
    }

    #[odra::event]
    pub struct VaultEnableProposed {
        pub vault: Address,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct VaultEnabled {
        pub vault: Address,
    }

    #[odra::event]
    pub struct VaultDisableProposed {
        pub vault: Address,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct VaultDisabled {
        pub vault: Address,
    }
}

#[odra::module(
    events = [
        events::VaultRegistered,
        events::VaultEnableProposed,
        events::VaultEnabled,
        events::VaultDisableProposed,
        events::VaultDisabled,
        GovernanceProposed,
        GovernanceAccepted
    ],
    errors = Error
)]
pub struct VaultFactory {
    governance: SubModule<Governance>,
    vaults: Mapping<Address, bool>,
    vault_by_index: Mapping<u32, Address>,
    index: Var<u32>,
    allowed: Mapping<Address, Timelock>,
}

#[odra::module]
impl VaultFactory {
    /// Initialize the registry; the deployer becomes governance
    pub fn init(&mut self) {
        let caller = self.env().caller();
        self.governance.init(caller);
        self.index.set(0);
    }

    /// Register a deployed vault (governance only)
    pub fn register_vault(&mut self, vault: Address) {
        self.governance.assert_governance();
        if is_zero_address(&vault) {
            self.env().revert(Error::InvalidAddress);
        }
        if self.is_vault(vault) {
            self.env().revert(Error::AlreadyRegistered);
        }
        let index = self.index.get_or_default();
        self.vaults.set(&vault, true);
        self.vault_by_index.set(&index, vault);
        self.index.set(index + 1);
        self.env().emit_event(events::VaultRegistered { vault, index });
    }

    /// Propose allowing `vault` to lock and mint
    pub fn enable_vault(&mut self, vault: Address) {
        self.governance.assert_governance();
        self.require_registered(vault);
        let now = now_secs(&self.env());
        let next = self
            .timelock_of(vault)
            .propose_enable(now)
            .unwrap_or_else(|e| self.env().revert(e));
        self.allowed.set(&vault, next);
        self.env().emit_event(events::VaultEnableProposed {
            vault,
            proposed_at: now,
        });
    }

    pub fn execute_enable_vault(&mut self, vault: Address) {
        self.governance.assert_governance();
        let next = self
            .timelock_of(vault)
            .execute_enable(now_secs(&self.env()), VAULT_TIMELOCK)
            .unwrap_or_else(|e| self.env().revert(e));
        self.allowed.set(&vault, next);
        self.env().emit_event(events::VaultEnabled { vault });
    }

    /// Propose revoking `vault`; it stays allowed until execution
    pub fn disable_vault(&mut self, vault: Address) {
        self.governance.assert_governance();
        self.require_registered(vault);
        let now = now_secs(&self.env());
        let next = self
            .timelock_of(vault)
            .propose_disable(now)
            .unwrap_or_else(|e| self.env().revert(e));
        self.allowed.set(&vault, next);
        self.env().emit_event(events::VaultDisableProposed {
            vault,
            proposed_at: now,
        });
    }

    pub fn execute_disable_vault(&mut self, vault: Address) {
        self.governance.assert_governance();
        let next = self
            .timelock_of(vault)
            .execute_disable(now_secs(&self.env()), VAULT_TIMELOCK)
            .unwrap_or_else(|e| self.env().revert(e));
        self.allowed.set(&vault, next);
        self.env().emit_event(events::VaultDisabled { vault });
    }

    // ==========================================
    // View Functions
    // ==========================================

    pub fn is_allowed(&self, vault: Address) -> bool {
        self.timelock_of(vault).is_active()
    }

    pub fn is_vault(&self, vault: Address) -> bool {
        self.vaults.get(&vault).unwrap_or_default()
    }

    pub fn vault_at(&self, index: u32) -> Option<Address> {
        self.vault_by_index.get(&index)
    }

    pub fn vault_count(&self) -> u32 {
        self.index.get_or_default()
    }

    pub fn timelock_of(&self, vault: Address) -> Timelock {
        self.allowed.get(&vault).unwrap_or_default()
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

    fn require_registered(&self, vault: Address) {
        if !self.is_vault(vault) {
            self.env().revert(Error::InvalidAddress);
        }
    }
}
