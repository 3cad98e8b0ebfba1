//! Protocol-wide error taxonomy.
//!
//! Every contract in the crate reverts with this enum, so a failure raised in
//! a nested call (for example a ledger burn inside `Vault::unlock`) reaches
//! the original caller with the same stable code.

use odra::prelude::*;

#[odra::odra_error]
pub enum Error {
    Unauthorized = 1,
    InvalidAddress = 2,
    InsufficientBalance = 3,
    InsufficientAllowance = 4,
    MintLimitExceeded = 5,
    TimelockNotElapsed = 6,
    NoTimelockSet = 7,
    StalePrice = 8,
    PriceDeviation = 9,
    InvalidConfiguration = 10,
    Underflow = 11,
    ZeroAmount = 12,
    SlippageExceeded = 13,
    InvalidStateTransition = 14,
    EmptyPool = 15,
    Overflow = 16,
    NoYieldWallet = 17,
    PermitExpired = 18,
    InvalidSignature = 19,
    CannotTargetSelfUser = 20,
    AlreadyRegistered = 21,
}
