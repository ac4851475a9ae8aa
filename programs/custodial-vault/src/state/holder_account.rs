use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    constants::HOLDER_EXTENSION_BYTES,
    error::VaultError,
    state::{borsh_deserialize_unchecked, SchemaVersion},
};

/// Outstanding delayed withdrawal.
///
/// Fixed width so the record layout never shifts between `None` and `Some`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingWithdrawal {
    pub is_active: bool,
    pub amount: u64,
    pub requested_at: UnixTimestamp,
    /// Delay in force when the request was filed
    pub delay_seconds: u64,
}

impl PendingWithdrawal {
    pub fn new(amount: u64, requested_at: UnixTimestamp, delay_seconds: u64) -> Self {
        Self {
            is_active: true,
            amount,
            requested_at,
            delay_seconds,
        }
    }

    /// Earliest timestamp at which the request can be executed
    pub fn available_at(&self) -> UnixTimestamp {
        let delay = i64::try_from(self.delay_seconds).unwrap_or(i64::MAX);
        self.requested_at.saturating_add(delay)
    }
}

/// Per-holder record, one PDA per (ledger, owner)
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct HolderAccount {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized flag
    pub is_initialized: bool,

    /// Schema version this record has been brought up to
    pub schema_version: SchemaVersion,

    /// Reserved bytes left in this record
    pub extension_budget: u16,

    /// Holder PDA bump
    pub bump: u8,

    // ---- V1 ----
    pub owner: Pubkey,

    /// Net deposited amount after fees
    pub balance: u64,

    /// Last yield settlement, or first deposit time (0 = never deposited)
    pub last_yield_checkpoint: UnixTimestamp,

    // ---- V2 ----
    pub cumulative_yield_claimed: u64,

    // ---- V3 ----
    pub pending_withdrawal: PendingWithdrawal,
}

impl HolderAccount {
    pub const DISCRIMINATOR: [u8; 8] = *b"VLTHOLDR";

    pub const V1_LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // schema_version
        2 + // extension_budget
        1 + // bump
        32 + // owner
        8 + // balance
        8; // last_yield_checkpoint

    pub const LEN: usize = Self::V1_LEN + HOLDER_EXTENSION_BYTES as usize;

    /// Fresh record laid out for `version`
    pub fn new(owner: Pubkey, bump: u8, version: SchemaVersion) -> Result<Self, VaultError> {
        Ok(Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            schema_version: version,
            extension_budget: version.holder_budget_at()?,
            bump,
            owner,
            balance: 0,
            last_yield_checkpoint: 0,
            cumulative_yield_claimed: 0,
            pending_withdrawal: PendingWithdrawal::default(),
        })
    }

    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() < Self::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        let holder: HolderAccount = borsh_deserialize_unchecked(data)?;
        holder.validate()?;
        Ok(holder)
    }

    pub fn pack(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        if dst.len() < Self::LEN {
            return Err(ProgramError::AccountDataTooSmall);
        }
        let mut writer: &mut [u8] = dst;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }

        if !self.is_initialized {
            return Err(VaultError::NotInitialized.into());
        }

        if self.extension_budget != self.schema_version.holder_budget_at()? {
            return Err(VaultError::InvalidAccountData.into());
        }

        let v2_neutral = self.cumulative_yield_claimed == 0;
        let v3_neutral = self.pending_withdrawal == PendingWithdrawal::default();
        let neutral = match self.schema_version {
            SchemaVersion::V1 => v2_neutral && v3_neutral,
            SchemaVersion::V2 => v3_neutral,
            SchemaVersion::V3 => true,
        };
        if !neutral {
            return Err(VaultError::InvalidAccountData.into());
        }

        Ok(())
    }

    pub fn has_deposited(&self) -> bool {
        self.last_yield_checkpoint != 0
    }

    pub fn pending(&self) -> Option<&PendingWithdrawal> {
        if self.pending_withdrawal.is_active {
            Some(&self.pending_withdrawal)
        } else {
            None
        }
    }

    pub fn clear_pending(&mut self) {
        self.pending_withdrawal = PendingWithdrawal::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_budget_tracks_version() {
        let owner = Pubkey::new_unique();
        let v1 = HolderAccount::new(owner, 1, SchemaVersion::V1).unwrap();
        let v3 = HolderAccount::new(owner, 1, SchemaVersion::V3).unwrap();
        assert_eq!(v1.extension_budget, HOLDER_EXTENSION_BYTES);
        assert_eq!(v3.extension_budget, 15);
        assert!(!v1.has_deposited());
        assert!(v3.pending().is_none());
    }

    #[test]
    fn test_pending_withdrawal_has_fixed_width() {
        let none = PendingWithdrawal::default().try_to_vec().unwrap();
        let some = PendingWithdrawal::new(5, 10, 20).try_to_vec().unwrap();
        assert_eq!(none.len(), some.len());
        assert_eq!(some.len(), SchemaVersion::V3.holder_bytes_added() as usize);
    }

    #[test]
    fn test_pack_unpack_fixed_length() {
        let mut holder = HolderAccount::new(Pubkey::new_unique(), 7, SchemaVersion::V3).unwrap();
        holder.balance = 1_000;
        holder.last_yield_checkpoint = 1_700_000_000;
        holder.pending_withdrawal = PendingWithdrawal::new(400, 1_700_000_100, 3_600);

        let mut data = vec![0u8; HolderAccount::LEN];
        holder.pack(&mut data).unwrap();
        let decoded = HolderAccount::unpack(&data).unwrap();

        assert_eq!(decoded, holder);
        assert_eq!(decoded.pending().unwrap().available_at(), 1_700_003_700);
    }

    #[test]
    fn test_validate_rejects_pending_request_on_v2_record() {
        let mut holder = HolderAccount::new(Pubkey::new_unique(), 7, SchemaVersion::V2).unwrap();
        holder.pending_withdrawal = PendingWithdrawal::new(1, 1, 1);
        assert!(holder.validate().is_err());
    }
}
