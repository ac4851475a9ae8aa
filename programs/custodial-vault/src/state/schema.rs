//! Schema versions and the reserved extension budget
//!
//! Every persisted record is allocated once with a fixed amount of reserved
//! space behind its V1 fields. Each later version appends its fields into the
//! front of that space and subtracts their encoded size from the record's
//! budget. Bytes handed to one version are never handed to another.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    constants::{HOLDER_EXTENSION_BYTES, LEDGER_EXTENSION_BYTES},
    error::VaultError,
};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    /// Plain vault: balances, deposit fee
    V1,
    /// Yield-bearing vault: yield rate, pause flag, claimed-yield tracking
    V2,
    /// Delayed-withdrawal vault: withdrawal delay, pending requests
    V3,
}

impl SchemaVersion {
    pub const LATEST: SchemaVersion = SchemaVersion::V3;

    pub fn next(self) -> Option<SchemaVersion> {
        match self {
            SchemaVersion::V1 => Some(SchemaVersion::V2),
            SchemaVersion::V2 => Some(SchemaVersion::V3),
            SchemaVersion::V3 => None,
        }
    }

    /// Encoded bytes of ledger fields introduced by this version
    pub const fn ledger_bytes_added(self) -> u16 {
        match self {
            SchemaVersion::V1 => 0,
            // yield_rate_bps (2) + deposits_paused (1) + total_yield_paid (8)
            SchemaVersion::V2 => 11,
            // withdrawal_delay_seconds (8)
            SchemaVersion::V3 => 8,
        }
    }

    /// Encoded bytes of holder fields introduced by this version
    pub const fn holder_bytes_added(self) -> u16 {
        match self {
            SchemaVersion::V1 => 0,
            // cumulative_yield_claimed (8)
            SchemaVersion::V2 => 8,
            // pending_withdrawal: is_active (1) + amount (8) + requested_at (8) + delay_seconds (8)
            SchemaVersion::V3 => 25,
        }
    }

    /// Ledger budget left once every version up to and including `self` is active
    pub fn ledger_budget_at(self) -> Result<u16, VaultError> {
        budget_at(self, LEDGER_EXTENSION_BYTES, SchemaVersion::ledger_bytes_added)
    }

    /// Holder budget left once every version up to and including `self` is active
    pub fn holder_budget_at(self) -> Result<u16, VaultError> {
        budget_at(self, HOLDER_EXTENSION_BYTES, SchemaVersion::holder_bytes_added)
    }
}

/// Take `bytes` out of a reserved budget
pub fn consume_budget(budget: u16, bytes: u16) -> Result<u16, VaultError> {
    budget
        .checked_sub(bytes)
        .ok_or(VaultError::InsufficientReservedSpace)
}

fn budget_at(
    version: SchemaVersion,
    initial: u16,
    added: fn(SchemaVersion) -> u16,
) -> Result<u16, VaultError> {
    let mut budget = initial;
    let mut current = SchemaVersion::V1;
    while let Some(next) = current.next() {
        if next > version {
            break;
        }
        budget = consume_budget(budget, added(next))?;
        current = next;
    }
    Ok(budget)
}
