//! Initialization and role-gated configuration

use solana_program::{msg, pubkey::Pubkey};

use crate::{
    capabilities::{AccessControl, Role},
    constants::MAX_BPS,
    engine::VaultEngine,
    error::VaultError,
    events::{
        DepositsPauseToggled, Event, RolesUpdated, WithdrawalDelayUpdated, YieldRateUpdated,
    },
    state::{Ledger, SchemaVersion},
};

/// Parameters for the V1 initialization slot
#[derive(Debug, Clone, Copy)]
pub struct InitializeParams {
    pub bump: u8,
    pub vault_authority_bump: u8,
    pub asset_mint: Pubkey,
    pub vault_token_account: Pubkey,
    pub admin: Pubkey,
    pub deposit_fee_bps: u16,
}

impl VaultEngine {
    /// Build the V1 ledger; `existing` is whatever already occupies the ledger slot
    pub fn initialize(
        existing: Option<&Ledger>,
        params: InitializeParams,
    ) -> Result<Ledger, VaultError> {
        if existing.map_or(false, |ledger| ledger.is_initialized) {
            return Err(VaultError::AlreadyInitialized);
        }
        if params.asset_mint == Pubkey::default() || params.admin == Pubkey::default() {
            msg!("Asset and admin must be set");
            return Err(VaultError::InvalidArgument);
        }
        if params.deposit_fee_bps > MAX_BPS {
            msg!("Deposit fee {} bps exceeds {}", params.deposit_fee_bps, MAX_BPS);
            return Err(VaultError::InvalidArgument);
        }

        Ok(Ledger::new(
            params.bump,
            params.vault_authority_bump,
            params.asset_mint,
            params.vault_token_account,
            params.admin,
            params.deposit_fee_bps,
        ))
    }

    pub fn set_yield_rate<C: AccessControl>(
        ledger: &mut Ledger,
        access: &C,
        caller: &Pubkey,
        rate_bps: u16,
    ) -> Result<(), VaultError> {
        Self::require_role(access, Role::Admin, caller)?;
        ledger.require_version(SchemaVersion::V2)?;
        if rate_bps > MAX_BPS {
            msg!("Yield rate {} bps exceeds {}", rate_bps, MAX_BPS);
            return Err(VaultError::InvalidArgument);
        }

        let old_bps = ledger.yield_rate_bps;
        ledger.yield_rate_bps = rate_bps;

        YieldRateUpdated {
            old_bps,
            new_bps: rate_bps,
        }
        .emit();

        Ok(())
    }

    /// Applies to requests filed from now on
    pub fn set_withdrawal_delay<C: AccessControl>(
        ledger: &mut Ledger,
        access: &C,
        caller: &Pubkey,
        seconds: u64,
    ) -> Result<(), VaultError> {
        Self::require_role(access, Role::Admin, caller)?;
        ledger.require_version(SchemaVersion::V3)?;

        let old_seconds = ledger.withdrawal_delay_seconds;
        ledger.withdrawal_delay_seconds = seconds;

        WithdrawalDelayUpdated {
            old_seconds,
            new_seconds: seconds,
        }
        .emit();

        Ok(())
    }

    pub fn pause_deposits<C: AccessControl>(
        ledger: &mut Ledger,
        access: &C,
        caller: &Pubkey,
    ) -> Result<(), VaultError> {
        Self::set_deposits_paused(ledger, access, caller, true)
    }

    pub fn unpause_deposits<C: AccessControl>(
        ledger: &mut Ledger,
        access: &C,
        caller: &Pubkey,
    ) -> Result<(), VaultError> {
        Self::set_deposits_paused(ledger, access, caller, false)
    }

    fn set_deposits_paused<C: AccessControl>(
        ledger: &mut Ledger,
        access: &C,
        caller: &Pubkey,
        paused: bool,
    ) -> Result<(), VaultError> {
        Self::require_role(access, Role::Admin, caller)?;
        ledger.require_version(SchemaVersion::V2)?;

        ledger.deposits_paused = paused;

        DepositsPauseToggled {
            paused,
            caller: *caller,
        }
        .emit();

        Ok(())
    }

    pub fn update_roles<C: AccessControl>(
        ledger: &mut Ledger,
        access: &C,
        caller: &Pubkey,
        admin: Option<Pubkey>,
        upgrade_authority: Option<Pubkey>,
    ) -> Result<(), VaultError> {
        Self::require_role(access, Role::Admin, caller)?;

        let mut roles = ledger.roles;
        if let Some(key) = admin {
            roles.admin = key;
        }
        if let Some(key) = upgrade_authority {
            roles.upgrade_authority = key;
        }
        if roles.admin == Pubkey::default() || roles.upgrade_authority == Pubkey::default() {
            return Err(VaultError::InvalidArgument);
        }
        ledger.roles = roles;

        RolesUpdated {
            admin: roles.admin,
            upgrade_authority: roles.upgrade_authority,
        }
        .emit();

        Ok(())
    }
}
