//! Version migration contract
//!
//! Migrations move the ledger forward one schema version at a time. A step
//! only writes the fields its version introduces, always to their neutral
//! value, and pays for them out of the reserved extension budget. Holder
//! records follow lazily: any operation touching a holder first replays the
//! same per-version steps on that record.

use solana_program::{msg, pubkey::Pubkey};

use crate::{
    capabilities::{AccessControl, Role},
    engine::VaultEngine,
    error::VaultError,
    events::{Event, HolderMigrated, SchemaMigrated},
    state::{consume_budget, HolderAccount, Ledger, PendingWithdrawal, SchemaVersion},
};

/// Ledger record one version ahead of `ledger`
pub fn ledger_step(ledger: &Ledger) -> Result<Ledger, VaultError> {
    let target = ledger
        .schema_version
        .next()
        .ok_or(VaultError::AlreadyMigrated)?;

    let mut next = ledger.clone();
    next.extension_budget = consume_budget(ledger.extension_budget, target.ledger_bytes_added())?;
    next.holder_extension_budget =
        consume_budget(ledger.holder_extension_budget, target.holder_bytes_added())?;

    match target {
        SchemaVersion::V1 => return Err(VaultError::AlreadyMigrated),
        SchemaVersion::V2 => {
            next.yield_rate_bps = 0;
            next.deposits_paused = false;
            next.total_yield_paid = 0;
        }
        SchemaVersion::V3 => {
            next.withdrawal_delay_seconds = 0;
        }
    }
    next.schema_version = target;

    Ok(next)
}

/// Holder record one version ahead of `holder`
pub fn holder_step(holder: &HolderAccount) -> Result<HolderAccount, VaultError> {
    let target = holder
        .schema_version
        .next()
        .ok_or(VaultError::AlreadyMigrated)?;

    let mut next = holder.clone();
    next.extension_budget = consume_budget(holder.extension_budget, target.holder_bytes_added())?;

    match target {
        SchemaVersion::V1 => return Err(VaultError::AlreadyMigrated),
        SchemaVersion::V2 => {
            next.cumulative_yield_claimed = 0;
        }
        SchemaVersion::V3 => {
            next.pending_withdrawal = PendingWithdrawal::default();
        }
    }
    next.schema_version = target;

    Ok(next)
}

impl VaultEngine {
    /// Advance the ledger to `target`, which must be exactly the next version
    pub fn migrate<C: AccessControl>(
        ledger: &mut Ledger,
        access: &C,
        caller: &Pubkey,
        target: SchemaVersion,
    ) -> Result<SchemaMigrated, VaultError> {
        Self::require_role(access, Role::Upgrader, caller)?;

        let from = ledger.schema_version;
        if target <= from {
            msg!("Schema already at {:?}, requested {:?}", from, target);
            return Err(VaultError::AlreadyMigrated);
        }
        if from.next() != Some(target) {
            msg!("Cannot migrate {:?} -> {:?} without intermediate steps", from, target);
            return Err(VaultError::MigrationOutOfOrder);
        }

        let next = ledger_step(ledger)?;
        *ledger = next;

        let event = SchemaMigrated {
            from,
            to: target,
            ledger_budget_remaining: ledger.extension_budget,
            holder_budget_remaining: ledger.holder_extension_budget,
        };
        event.emit();

        msg!(
            "Ledger migrated {:?} -> {:?}, reserved bytes left: ledger {}, holder {}",
            from,
            target,
            ledger.extension_budget,
            ledger.holder_extension_budget
        );

        Ok(event)
    }

    /// Bring `holder` up to the ledger's schema version. Returns whether anything changed.
    pub fn sync_holder(ledger: &Ledger, holder: &mut HolderAccount) -> Result<bool, VaultError> {
        if holder.schema_version > ledger.schema_version {
            msg!(
                "Holder record at {:?} is ahead of ledger at {:?}",
                holder.schema_version,
                ledger.schema_version
            );
            return Err(VaultError::InvalidAccountData);
        }

        let from = holder.schema_version;
        let mut current = holder.clone();
        while current.schema_version < ledger.schema_version {
            current = holder_step(&current)?;
        }

        if current.schema_version == from {
            return Ok(false);
        }

        *holder = current;
        HolderMigrated {
            holder: holder.owner,
            from,
            to: holder.schema_version,
        }
        .emit();

        Ok(true)
    }

    /// Explicit holder migration, permissionless since it only writes neutral values
    pub fn migrate_holder(ledger: &Ledger, holder: &mut HolderAccount) -> Result<(), VaultError> {
        if !Self::sync_holder(ledger, holder)? {
            return Err(VaultError::AlreadyMigrated);
        }
        Ok(())
    }
}
