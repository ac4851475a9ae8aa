//! Ledger engine
//!
//! Pure accounting over a [`Ledger`] and one [`HolderAccount`] at a time. The
//! engine knows nothing about accounts, signers or CPI: custody moves through
//! an [`AssetTransfer`], permissions through an [`AccessControl`] and time is
//! passed in as a unix timestamp.
//!
//! Every public operation is all-or-nothing. Records are mutated in place,
//! outbound transfers run only after the decrement has been applied, and any
//! failure (including a rejected transfer) restores both records to their
//! state on entry.

pub mod accounting;
pub mod admin;
pub mod fee;
pub mod migration;
pub mod withdrawal;
pub mod yield_accrual;

pub use accounting::*;
pub use admin::*;
pub use fee::*;
pub use withdrawal::*;
pub use yield_accrual::*;

use solana_program::{msg, pubkey::Pubkey};

use crate::{
    capabilities::{AccessControl, AssetTransfer, Role},
    error::VaultError,
    state::{HolderAccount, Ledger},
};

/// Main vault ledger engine
pub struct VaultEngine;

impl VaultEngine {
    /// Run `op` against the live records, restoring both if it fails
    pub(crate) fn all_or_nothing<T, F>(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        op: F,
    ) -> Result<T, VaultError>
    where
        F: FnOnce(&mut Ledger, &mut HolderAccount) -> Result<T, VaultError>,
    {
        let ledger_snapshot = ledger.clone();
        let holder_snapshot = holder.clone();

        match op(ledger, holder) {
            Ok(value) => Ok(value),
            Err(err) => {
                *ledger = ledger_snapshot;
                *holder = holder_snapshot;
                Err(err)
            }
        }
    }

    /// Release `amount` to the holder. Callers apply the decrement first.
    pub(crate) fn pay_out<A: AssetTransfer>(
        asset: &mut A,
        holder: &HolderAccount,
        amount: u64,
    ) -> Result<(), VaultError> {
        asset.transfer_out(&holder.owner, amount).map_err(|err| {
            msg!("Transfer out of {} to {} failed: {:?}", amount, holder.owner, err);
            VaultError::TransferFailed
        })
    }

    pub(crate) fn require_role<C: AccessControl>(
        access: &C,
        role: Role,
        principal: &Pubkey,
    ) -> Result<(), VaultError> {
        if !access.has_role(role, principal) {
            msg!("{} lacks role {:?}", principal, role);
            return Err(VaultError::Unauthorized);
        }
        Ok(())
    }
}

pub(crate) fn checked_add(a: u64, b: u64) -> Result<u64, VaultError> {
    a.checked_add(b).ok_or(VaultError::ArithmeticOverflow)
}

pub(crate) fn checked_sub(a: u64, b: u64) -> Result<u64, VaultError> {
    a.checked_sub(b).ok_or(VaultError::ArithmeticOverflow)
}
