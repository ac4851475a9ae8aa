//! Delayed withdrawal workflow
//!
//! Per holder: NoRequest -> Pending -> (Executed | cancelled by emergency).
//! A request stores the delay in force when it was filed; later changes to
//! the ledger delay only affect requests filed after them.

use solana_program::{clock::UnixTimestamp, msg};

use crate::{
    capabilities::AssetTransfer,
    engine::VaultEngine,
    error::VaultError,
    events::{EmergencyWithdrawn, Event, WithdrawalExecuted, WithdrawalRequested},
    state::{HolderAccount, Ledger, PendingWithdrawal, SchemaVersion},
};

/// Read-only view of an outstanding request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalRequestView {
    pub amount: u64,
    pub requested_at: UnixTimestamp,
    pub available_at: UnixTimestamp,
}

impl VaultEngine {
    pub fn request_withdrawal(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<PendingWithdrawal, VaultError> {
        Self::all_or_nothing(ledger, holder, |ledger, holder| {
            Self::sync_holder(ledger, holder)?;
            Self::file_request(ledger, holder, amount, now)
        })
    }

    pub fn execute_withdrawal<A: AssetTransfer>(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        asset: &mut A,
        now: UnixTimestamp,
    ) -> Result<u64, VaultError> {
        Self::all_or_nothing(ledger, holder, |ledger, holder| {
            ledger.require_version(SchemaVersion::V3)?;
            Self::sync_holder(ledger, holder)?;

            let request = *holder.pending().ok_or(VaultError::NoPendingWithdrawal)?;
            if now < request.available_at() {
                msg!(
                    "Withdrawal available at {}, now {}",
                    request.available_at(),
                    now
                );
                return Err(VaultError::DelayNotElapsed);
            }
            if request.amount > holder.balance {
                msg!("Insufficient balance: {} > {}", request.amount, holder.balance);
                return Err(VaultError::InsufficientBalance);
            }

            holder.clear_pending();
            Self::debit(ledger, holder, request.amount)?;
            Self::pay_out(asset, holder, request.amount)?;

            WithdrawalExecuted {
                holder: holder.owner,
                amount: request.amount,
            }
            .emit();

            Ok(request.amount)
        })
    }

    /// Escape hatch: pays out the whole balance regardless of delay or pending state
    pub fn emergency_withdraw<A: AssetTransfer>(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        asset: &mut A,
    ) -> Result<u64, VaultError> {
        Self::all_or_nothing(ledger, holder, |ledger, holder| {
            ledger.require_version(SchemaVersion::V3)?;
            Self::sync_holder(ledger, holder)?;

            let amount = holder.balance;
            if amount == 0 {
                return Err(VaultError::NoBalance);
            }

            let cancelled_request = holder.pending().map(|request| request.amount);
            holder.clear_pending();
            // Back to the never-deposited state; unclaimed yield is forfeited
            holder.last_yield_checkpoint = 0;
            Self::debit(ledger, holder, amount)?;
            Self::pay_out(asset, holder, amount)?;

            EmergencyWithdrawn {
                holder: holder.owner,
                amount,
                cancelled_request,
            }
            .emit();

            msg!("Emergency withdrawal of {} by {}", amount, holder.owner);

            Ok(amount)
        })
    }

    pub fn get_withdrawal_request(holder: &HolderAccount) -> Option<WithdrawalRequestView> {
        holder.pending().map(|request| WithdrawalRequestView {
            amount: request.amount,
            requested_at: request.requested_at,
            available_at: request.available_at(),
        })
    }

    /// Record a new request; the caller has already synced the holder
    pub(crate) fn file_request(
        ledger: &Ledger,
        holder: &mut HolderAccount,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<PendingWithdrawal, VaultError> {
        ledger.require_version(SchemaVersion::V3)?;

        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if holder.pending().is_some() {
            return Err(VaultError::RequestAlreadyPending);
        }
        if amount > holder.balance {
            msg!("Insufficient balance: {} > {}", amount, holder.balance);
            return Err(VaultError::InsufficientBalance);
        }

        let request = PendingWithdrawal::new(amount, now, ledger.withdrawal_delay_seconds);
        holder.pending_withdrawal = request;

        WithdrawalRequested {
            holder: holder.owner,
            amount,
            requested_at: now,
            available_at: request.available_at(),
        }
        .emit();

        Ok(request)
    }
}
