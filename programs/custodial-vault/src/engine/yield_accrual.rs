//! Time-proportional yield accrual

use solana_program::{clock::UnixTimestamp, msg};

use crate::{
    capabilities::AssetTransfer,
    constants::{BPS_DENOMINATOR, SECONDS_PER_YEAR},
    engine::{checked_add, VaultEngine},
    error::VaultError,
    events::{Event, YieldClaimed},
    state::{HolderAccount, Ledger, SchemaVersion},
};

/// Yield snapshot for one holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserYield {
    pub pending: u64,
    pub cumulative_claimed: u64,
    pub last_checkpoint: UnixTimestamp,
}

/// floor(balance * rate_bps * elapsed / (SECONDS_PER_YEAR * 10_000))
pub fn accrued_yield(balance: u64, rate_bps: u16, elapsed_seconds: u64) -> Result<u64, VaultError> {
    let numerator = (balance as u128)
        .checked_mul(rate_bps as u128)
        .and_then(|v| v.checked_mul(elapsed_seconds as u128))
        .ok_or(VaultError::ArithmeticOverflow)?;
    let denominator = SECONDS_PER_YEAR as u128 * BPS_DENOMINATOR as u128;

    u64::try_from(numerator / denominator).map_err(|_| VaultError::ArithmeticOverflow)
}

impl VaultEngine {
    pub fn pending_yield(
        ledger: &Ledger,
        holder: &HolderAccount,
        now: UnixTimestamp,
    ) -> Result<u64, VaultError> {
        if !holder.has_deposited() {
            return Ok(0);
        }
        // A clock behind the checkpoint accrues nothing
        let elapsed = now.saturating_sub(holder.last_yield_checkpoint).max(0) as u64;
        accrued_yield(holder.balance, ledger.active_yield_rate_bps(), elapsed)
    }

    pub fn get_user_yield(
        ledger: &Ledger,
        holder: &HolderAccount,
        now: UnixTimestamp,
    ) -> Result<UserYield, VaultError> {
        Ok(UserYield {
            pending: Self::pending_yield(ledger, holder, now)?,
            cumulative_claimed: holder.cumulative_yield_claimed,
            last_checkpoint: holder.last_yield_checkpoint,
        })
    }

    pub fn claim_yield<A: AssetTransfer>(
        ledger: &mut Ledger,
        holder: &mut HolderAccount,
        asset: &mut A,
        now: UnixTimestamp,
    ) -> Result<u64, VaultError> {
        Self::all_or_nothing(ledger, holder, |ledger, holder| {
            ledger.require_version(SchemaVersion::V2)?;
            Self::sync_holder(ledger, holder)?;

            if !holder.has_deposited() {
                return Err(VaultError::NoDeposits);
            }
            let amount = Self::pending_yield(ledger, holder, now)?;
            if amount == 0 {
                return Err(VaultError::NothingToClaim);
            }

            // Checkpoint moves before the payout leaves custody
            holder.last_yield_checkpoint = now;
            holder.cumulative_yield_claimed = checked_add(holder.cumulative_yield_claimed, amount)?;
            ledger.total_yield_paid = checked_add(ledger.total_yield_paid, amount)?;

            Self::pay_out(asset, holder, amount)?;

            YieldClaimed {
                holder: holder.owner,
                amount,
                cumulative_claimed: holder.cumulative_yield_claimed,
            }
            .emit();

            msg!("Yield claimed: {} (total {})", amount, holder.cumulative_yield_claimed);

            Ok(amount)
        })
    }
}
