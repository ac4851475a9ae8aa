//! Account ledger: deposits, withdrawals, balances

use solana_program::{clock::UnixTimestamp, msg};

use crate::{
    capabilities::AssetTransfer,
    engine::{checked_add, checked_sub, compute_fee, FeeQuote, VaultEngine},
    error::VaultError,
    events::{Deposited, Event, Withdrawn},
    state::{HolderAccount, Ledger, PendingWithdrawal},
};

/// Result of `withdraw`, which either pays out or files a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    Completed { amount: u64 },
    Requested(PendingWithdrawal),
}

impl VaultEngine {
    pub fn deposit<A: AssetTransfer>(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        asset: &mut A,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<FeeQuote, VaultError> {
        Self::all_or_nothing(ledger, holder, |ledger, holder| {
            Self::sync_holder(ledger, holder)?;

            if amount == 0 {
                return Err(VaultError::InvalidAmount);
            }
            if ledger.is_deposits_paused() {
                msg!("Deposit rejected: deposits are paused");
                return Err(VaultError::DepositsPaused);
            }

            let quote = compute_fee(amount, ledger.deposit_fee_bps)?;
            let new_balance = checked_add(holder.balance, quote.net)?;
            let new_total = checked_add(ledger.total_deposits, quote.net)?;
            let new_fees = checked_add(ledger.total_fees_collected, quote.fee)?;

            // Full gross amount enters custody; the fee simply stays there
            asset.transfer_in(&holder.owner, amount).map_err(|err| {
                msg!("Transfer in of {} from {} failed: {:?}", amount, holder.owner, err);
                VaultError::TransferFailed
            })?;

            holder.balance = new_balance;
            ledger.total_deposits = new_total;
            ledger.total_fees_collected = new_fees;
            if !holder.has_deposited() {
                holder.last_yield_checkpoint = now;
            }

            Deposited {
                holder: holder.owner,
                net: quote.net,
                fee: quote.fee,
            }
            .emit();

            Ok(quote)
        })
    }

    /// Immediate withdrawal, or a withdrawal request when a delay is configured
    pub fn withdraw<A: AssetTransfer>(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        asset: &mut A,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<WithdrawOutcome, VaultError> {
        Self::all_or_nothing(ledger, holder, |ledger, holder| {
            Self::sync_holder(ledger, holder)?;

            if amount == 0 {
                return Err(VaultError::InvalidAmount);
            }
            if amount > holder.balance {
                msg!("Insufficient balance: {} > {}", amount, holder.balance);
                return Err(VaultError::InsufficientBalance);
            }

            if ledger.withdrawal_delay_enabled() {
                let request = Self::file_request(ledger, holder, amount, now)?;
                return Ok(WithdrawOutcome::Requested(request));
            }

            Self::debit(ledger, holder, amount)?;
            Self::pay_out(asset, holder, amount)?;

            Withdrawn {
                holder: holder.owner,
                amount,
            }
            .emit();

            Ok(WithdrawOutcome::Completed { amount })
        })
    }

    pub fn balance_of(holder: &HolderAccount) -> u64 {
        holder.balance
    }

    /// total_deposits == sum of all holder balances
    pub fn conservation_holds<'a, I>(ledger: &Ledger, holders: I) -> bool
    where
        I: IntoIterator<Item = &'a HolderAccount>,
    {
        let sum = holders
            .into_iter()
            .try_fold(0u64, |acc, holder| acc.checked_add(holder.balance));
        sum == Some(ledger.total_deposits)
    }

    /// Remove `amount` from holder and ledger totals
    pub(crate) fn debit(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        amount: u64,
    ) -> Result<(), VaultError> {
        let new_balance = holder
            .balance
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientBalance)?;
        let new_total = checked_sub(ledger.total_deposits, amount)?;

        holder.balance = new_balance;
        ledger.total_deposits = new_total;
        Ok(())
    }
}
