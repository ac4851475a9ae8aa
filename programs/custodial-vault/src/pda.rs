//! Program Derived Address derivation

use solana_program::{bpf_loader_upgradeable, msg, pubkey::Pubkey};

use crate::error::VaultError;

/// PDA seed constants
pub mod seeds {
    pub const LEDGER: &[u8] = b"ledger";
    pub const VAULT_AUTHORITY: &[u8] = b"vault_authority";
    pub const HOLDER: &[u8] = b"holder";
}

/// Ledger PDA, one per custodied asset
pub struct LedgerPDA;
impl LedgerPDA {
    pub fn derive(program_id: &Pubkey, asset_mint: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::LEDGER, asset_mint.as_ref()], program_id)
    }
}

/// Signs custody transfers out of the vault token account
pub struct VaultAuthorityPDA;
impl VaultAuthorityPDA {
    pub fn derive(program_id: &Pubkey, ledger: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::VAULT_AUTHORITY, ledger.as_ref()], program_id)
    }
}

/// Per-holder record
pub struct HolderPDA;
impl HolderPDA {
    pub fn derive(program_id: &Pubkey, ledger: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::HOLDER, ledger.as_ref(), owner.as_ref()],
            program_id,
        )
    }
}

/// The loader's program-data account, which names the upgrade authority
pub struct ProgramDataPDA;
impl ProgramDataPDA {
    pub fn derive(program_id: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[program_id.as_ref()], &bpf_loader_upgradeable::id()).0
    }
}

/// Check `account_key` against the address derived from `seeds`, returning the bump
pub fn validate_pda_derivation(
    account_key: &Pubkey,
    program_id: &Pubkey,
    seeds: &[&[u8]],
) -> Result<u8, VaultError> {
    let (expected_key, bump) = Pubkey::find_program_address(seeds, program_id);

    if account_key != &expected_key {
        msg!("Expected PDA {}, got {}", expected_key, account_key);
        return Err(VaultError::InvalidPDA);
    }

    Ok(bump)
}
