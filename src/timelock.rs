//! Timelocked boolean flags.
//!
//! Vault allow-list entries, yield-wallet factories and stablecoin minters
//! all move through the same two-transaction state machine:
//!
//! ```text
//! Inactive --propose_enable--> PendingEnable(t) --execute_enable--> Active
//! Active --propose_disable--> PendingDisable(t) --execute_disable--> Inactive
//! ```
//!
//! Executing requires `now - t >= delay`. Re-proposing overwrites `t`.
//! Successful execution resets the timestamp to zero so an old proposal can
//! never be replayed for a later cycle.

use odra::prelude::*;

use crate::errors::Error;

/// Minter activation delay on the stablecoin (7 days, seconds)
pub const MINTER_TIMELOCK: u64 = 604_800;
/// Vault enable/disable delay on the factory (3 days, seconds)
pub const VAULT_TIMELOCK: u64 = 259_200;
/// Yield-wallet factory enable delay on a vault (3 days, seconds)
pub const YIELD_FACTORY_TIMELOCK: u64 = 259_200;

#[odra::odra_type]
#[derive(Default)]
pub enum TimelockStatus {
    #[default]
    Inactive = 0,
    PendingEnable = 1,
    Active = 2,
    PendingDisable = 3,
}

#[odra::odra_type]
#[derive(Default)]
pub struct Timelock {
    pub status: TimelockStatus,
    /// Proposal time in seconds; zero outside the pending states
    pub proposed_at: u64,
}

impl Timelock {
    fn settled(status: TimelockStatus) -> Self {
        Self {
            status,
            proposed_at: 0,
        }
    }

    fn pending(status: TimelockStatus, now: u64) -> Self {
        Self {
            status,
            proposed_at: now,
        }
    }

    /// The flag grants its right while active or while a disable is pending.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            TimelockStatus::Active | TimelockStatus::PendingDisable
        )
    }

    pub fn propose_enable(&self, now: u64) -> Result<Self, Error> {
        match self.status {
            TimelockStatus::Inactive | TimelockStatus::PendingEnable => {
                Ok(Self::pending(TimelockStatus::PendingEnable, now))
            }
            TimelockStatus::Active | TimelockStatus::PendingDisable => {
                Err(Error::InvalidStateTransition)
            }
        }
    }

    pub fn execute_enable(&self, now: u64, delay: u64) -> Result<Self, Error> {
        match self.status {
            TimelockStatus::PendingEnable => {
                self.require_elapsed(now, delay)?;
                Ok(Self::settled(TimelockStatus::Active))
            }
            _ => Err(Error::NoTimelockSet),
        }
    }

    pub fn propose_disable(&self, now: u64) -> Result<Self, Error> {
        match self.status {
            TimelockStatus::Active | TimelockStatus::PendingDisable => {
                Ok(Self::pending(TimelockStatus::PendingDisable, now))
            }
            TimelockStatus::Inactive | TimelockStatus::PendingEnable => {
                Err(Error::InvalidStateTransition)
            }
        }
    }

    pub fn execute_disable(&self, now: u64, delay: u64) -> Result<Self, Error> {
        match self.status {
            TimelockStatus::PendingDisable => {
                self.require_elapsed(now, delay)?;
                Ok(Self::settled(TimelockStatus::Inactive))
            }
            _ => Err(Error::NoTimelockSet),
        }
    }

    /// Immediate removal, used where dropping a right carries no risk.
    pub fn revoke(&self) -> Self {
        Self::settled(TimelockStatus::Inactive)
    }

    fn require_elapsed(&self, now: u64, delay: u64) -> Result<(), Error> {
        if now.saturating_sub(self.proposed_at) < delay {
            return Err(Error::TimelockNotElapsed);
        }
        Ok(())
    }
}

/// Current block time in seconds (the host reports milliseconds).
pub fn now_secs(env: &ContractEnv) -> u64 {
    env.get_block_time() / 1000
}
