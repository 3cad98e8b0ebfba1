//! Two-step governance handover, embedded as a submodule by the stablecoin,
//! the factory and every vault.
//!
//! The current governance proposes a successor with `change_governance`;
//! the successor takes over by calling `accept_governance` itself.

use odra::prelude::*;

use crate::address::is_zero_address;
use crate::errors::Error;

pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct GovernanceProposed {
        pub governance: Address,
        pub pending_governance: Address,
    }

    #[odra::event]
    pub struct GovernanceAccepted {
        pub previous_governance: Option<Address>,
        pub governance: Address,
    }
}

#[odra::module(errors = Error)]
pub struct Governance {
    governance: Var<Address>,
    pending_governance: Var<Option<Address>>,
}

#[odra::module]
impl Governance {
    pub fn init(&mut self, governance: Address) {
        if is_zero_address(&governance) {
            self.env().revert(Error::InvalidAddress);
        }
        self.governance.set(governance);
        self.pending_governance.set(None);
    }

    pub fn governance(&self) -> Option<Address> {
        self.governance.get()
    }

    pub fn pending_governance(&self) -> Option<Address> {
        self.pending_governance.get().flatten()
    }

    /// Propose a new governance address (governance only)
    pub fn change_governance(&mut self, new_governance: Address) {
        self.assert_governance();
        if is_zero_address(&new_governance) {
            self.env().revert(Error::InvalidAddress);
        }
        self.pending_governance.set(Some(new_governance));
        self.env().emit_event(events::GovernanceProposed {
            governance: self.env().caller(),
            pending_governance: new_governance,
        });
    }

    /// Accept a pending governance proposal (proposed address only)
    pub fn accept_governance(&mut self) {
        let caller = self.env().caller();
        if self.pending_governance() != Some(caller) {
            self.env().revert(Error::Unauthorized);
        }
        let previous_governance = self.governance.get();
        self.governance.set(caller);
        self.pending_governance.set(None);
        self.env().emit_event(events::GovernanceAccepted {
            previous_governance,
            governance: caller,
        });
    }
}

impl Governance {
    pub fn is_governance(&self, address: &Address) -> bool {
        self.governance.get().as_ref() == Some(address)
    }

    pub fn assert_governance(&self) {
        if !self.is_governance(&self.env().caller()) {
            self.env().revert(Error::Unauthorized);
        }
    }
}
