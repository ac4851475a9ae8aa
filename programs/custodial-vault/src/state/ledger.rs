use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::{
    constants::{HOLDER_EXTENSION_BYTES, LEDGER_EXTENSION_BYTES, MAX_BPS},
    error::VaultError,
    state::{borsh_deserialize_unchecked, RoleAssignments, SchemaVersion},
};

/// Global ledger record
///
/// Field order is the persisted layout. V2 and V3 fields sit at the front of
/// the V1 reserved region and stay zero until their migration has run.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized flag
    pub is_initialized: bool,

    /// Active schema version
    pub schema_version: SchemaVersion,

    /// Reserved bytes left in this record
    pub extension_budget: u16,

    /// Reserved bytes left in every holder record at `schema_version`
    pub holder_extension_budget: u16,

    /// Ledger PDA bump
    pub bump: u8,

    /// Vault authority PDA bump
    pub vault_authority_bump: u8,

    // ---- V1 ----
    /// Mint of the single custodied asset
    pub asset_mint: Pubkey,

    /// Token account holding custody, owned by the vault authority PDA
    pub vault_token_account: Pubkey,

    /// Role table consulted for admin and upgrade operations
    pub roles: RoleAssignments,

    /// Deposit fee in basis points
    pub deposit_fee_bps: u16,

    /// Sum of all holder balances
    pub total_deposits: u64,

    /// Fees retained in custody since initialization
    pub total_fees_collected: u64,

    // ---- V2 ----
    /// Annualized yield rate in basis points (0 = disabled)
    pub yield_rate_bps: u16,

    pub deposits_paused: bool,

    /// Yield paid out of custody since V2
    pub total_yield_paid: u64,

    // ---- V3 ----
    /// Delay applied to new withdrawal requests (0 = immediate withdrawals)
    pub withdrawal_delay_seconds: u64,
}

impl Ledger {
    pub const DISCRIMINATOR: [u8; 8] = *b"VLTLEDGR";

    pub const V1_LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // schema_version
        2 + // extension_budget
        2 + // holder_extension_budget
        1 + // bump
        1 + // vault_authority_bump
        32 + // asset_mint
        32 + // vault_token_account
        RoleAssignments::LEN + // roles
        2 + // deposit_fee_bps
        8 + // total_deposits
        8; // total_fees_collected

    pub const LEN: usize = Self::V1_LEN + LEDGER_EXTENSION_BYTES as usize;

    /// Fresh V1 ledger
    pub fn new(
        bump: u8,
        vault_authority_bump: u8,
        asset_mint: Pubkey,
        vault_token_account: Pubkey,
        admin: Pubkey,
        deposit_fee_bps: u16,
    ) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            schema_version: SchemaVersion::V1,
            extension_budget: LEDGER_EXTENSION_BYTES,
            holder_extension_budget: HOLDER_EXTENSION_BYTES,
            bump,
            vault_authority_bump,
            asset_mint,
            vault_token_account,
            roles: RoleAssignments::new(admin),
            deposit_fee_bps,
            total_deposits: 0,
            total_fees_collected: 0,
            yield_rate_bps: 0,
            deposits_paused: false,
            total_yield_paid: 0,
            withdrawal_delay_seconds: 0,
        }
    }

    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() < Self::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        let ledger: Ledger = borsh_deserialize_unchecked(data)?;
        ledger.validate()?;
        Ok(ledger)
    }

    pub fn pack(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        if dst.len() < Self::LEN {
            return Err(ProgramError::AccountDataTooSmall);
        }
        let mut writer: &mut [u8] = dst;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::InvalidAccountData)
    }

    /// Whether raw account data has already been initialized as a ledger
    pub fn is_initialized_data(data: &[u8]) -> bool {
        data.len() >= 9 && data[..8] == Self::DISCRIMINATOR && data[8] == 1
    }

    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }

        if !self.is_initialized {
            return Err(VaultError::NotInitialized.into());
        }

        if self.deposit_fee_bps > MAX_BPS || self.yield_rate_bps > MAX_BPS {
            return Err(VaultError::InvalidAccountData.into());
        }

        // Budgets must match exactly what the active versions consumed
        if self.extension_budget != self.schema_version.ledger_budget_at()?
            || self.holder_extension_budget != self.schema_version.holder_budget_at()?
        {
            return Err(VaultError::InvalidAccountData.into());
        }

        if !self.inactive_fields_are_neutral() {
            return Err(VaultError::InvalidAccountData.into());
        }

        Ok(())
    }

    /// Fields of versions not yet migrated to must still hold their zero encoding
    pub fn inactive_fields_are_neutral(&self) -> bool {
        let v2_neutral = self.yield_rate_bps == 0
            && !self.deposits_paused
            && self.total_yield_paid == 0;
        let v3_neutral = self.withdrawal_delay_seconds == 0;

        match self.schema_version {
            SchemaVersion::V1 => v2_neutral && v3_neutral,
            SchemaVersion::V2 => v3_neutral,
            SchemaVersion::V3 => true,
        }
    }

    pub fn require_version(&self, minimum: SchemaVersion) -> Result<(), VaultError> {
        if self.schema_version < minimum {
            return Err(VaultError::UnsupportedSchemaVersion);
        }
        Ok(())
    }

    /// Yield rate in force (always 0 before V2)
    pub fn active_yield_rate_bps(&self) -> u16 {
        if self.schema_version >= SchemaVersion::V2 {
            self.yield_rate_bps
        } else {
            0
        }
    }

    /// Whether `withdraw` routes to the request path
    pub fn withdrawal_delay_enabled(&self) -> bool {
        self.schema_version >= SchemaVersion::V3 && self.withdrawal_delay_seconds > 0
    }

    pub fn is_deposits_paused(&self) -> bool {
        self.schema_version >= SchemaVersion::V2 && self.deposits_paused
    }
}
