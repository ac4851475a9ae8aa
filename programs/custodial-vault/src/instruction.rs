use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    pda::{HolderPDA, LedgerPDA, ProgramDataPDA, VaultAuthorityPDA},
    state::SchemaVersion,
};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum VaultInstruction {
    /// Create the ledger for one asset at V1
    /// Accounts:
    /// 0. `[signer, writable]` Payer
    /// 1. `[writable]` Ledger PDA
    /// 2. `[]` Asset mint
    /// 3. `[]` Vault token account (owned by the vault authority PDA)
    /// 4. `[]` Vault authority PDA
    /// 5. `[]` System program
    /// 6. `[]` Program data account (payer must be its upgrade authority)
    Initialize { admin: Pubkey, deposit_fee_bps: u16 },

    /// Deposit into the vault, creating the holder record on first use
    /// Accounts:
    /// 0. `[signer, writable]` Holder
    /// 1. `[writable]` Ledger PDA
    /// 2. `[writable]` Holder PDA
    /// 3. `[writable]` Holder token account
    /// 4. `[writable]` Vault token account
    /// 5. `[]` Token program
    /// 6. `[]` System program
    Deposit { amount: u64 },

    /// Withdraw now, or file a request when a delay is configured
    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[writable]` Ledger PDA
    /// 2. `[writable]` Holder PDA
    /// 3. `[writable]` Holder token account
    /// 4. `[writable]` Vault token account
    /// 5. `[]` Vault authority PDA
    /// 6. `[]` Token program
    Withdraw { amount: u64 },

    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[]` Ledger PDA
    /// 2. `[writable]` Holder PDA
    RequestWithdrawal { amount: u64 },

    /// Accounts: same as `Withdraw`
    ExecuteWithdrawal,

    /// Accounts: same as `Withdraw`
    EmergencyWithdraw,

    /// Accounts: same as `Withdraw`
    ClaimYield,

    /// Accounts:
    /// 0. `[signer]` Admin
    /// 1. `[writable]` Ledger PDA
    SetYieldRate { bps: u16 },

    /// Accounts:
    /// 0. `[signer]` Admin
    /// 1. `[writable]` Ledger PDA
    SetWithdrawalDelay { seconds: u64 },

    /// Accounts:
    /// 0. `[signer]` Admin
    /// 1. `[writable]` Ledger PDA
    PauseDeposits,

    /// Accounts:
    /// 0. `[signer]` Admin
    /// 1. `[writable]` Ledger PDA
    UnpauseDeposits,

    /// Advance the ledger schema by one version
    /// Accounts:
    /// 0. `[signer]` Upgrade authority
    /// 1. `[writable]` Ledger PDA
    Migrate { target: SchemaVersion },

    /// Bring a holder record up to the ledger's version
    /// Accounts:
    /// 0. `[]` Ledger PDA
    /// 1. `[writable]` Holder PDA
    MigrateHolder,

    /// Accounts:
    /// 0. `[signer]` Admin
    /// 1. `[writable]` Ledger PDA
    UpdateRoles {
        admin: Option<Pubkey>,
        upgrade_authority: Option<Pubkey>,
    },
}

impl VaultInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }
}

// Helper functions to create instructions

pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    asset_mint: &Pubkey,
    vault_token_account: &Pubkey,
    admin: &Pubkey,
    deposit_fee_bps: u16,
) -> Instruction {
    let (ledger, _) = LedgerPDA::derive(program_id, asset_mint);
    let (vault_authority, _) = VaultAuthorityPDA::derive(program_id, &ledger);

    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::Initialize {
            admin: *admin,
            deposit_fee_bps,
        },
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(ledger, false),
            AccountMeta::new_readonly(*asset_mint, false),
            AccountMeta::new_readonly(*vault_token_account, false),
            AccountMeta::new_readonly(vault_authority, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(ProgramDataPDA::derive(program_id), false),
        ],
    )
}

pub fn deposit(
    program_id: &Pubkey,
    holder: &Pubkey,
    asset_mint: &Pubkey,
    holder_token_account: &Pubkey,
    vault_token_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let (ledger, _) = LedgerPDA::derive(program_id, asset_mint);
    let (holder_pda, _) = HolderPDA::derive(program_id, &ledger, holder);

    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::Deposit { amount },
        vec![
            AccountMeta::new(*holder, true),
            AccountMeta::new(ledger, false),
            AccountMeta::new(holder_pda, false),
            AccountMeta::new(*holder_token_account, false),
            AccountMeta::new(*vault_token_account, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Accounts shared by every instruction that may pay out of custody
fn payout_accounts(
    program_id: &Pubkey,
    holder: &Pubkey,
    asset_mint: &Pubkey,
    holder_token_account: &Pubkey,
    vault_token_account: &Pubkey,
) -> Vec<AccountMeta> {
    let (ledger, _) = LedgerPDA::derive(program_id, asset_mint);
    let (holder_pda, _) = HolderPDA::derive(program_id, &ledger, holder);
    let (vault_authority, _) = VaultAuthorityPDA::derive(program_id, &ledger);

    vec![
        AccountMeta::new_readonly(*holder, true),
        AccountMeta::new(ledger, false),
        AccountMeta::new(holder_pda, false),
        AccountMeta::new(*holder_token_account, false),
        AccountMeta::new(*vault_token_account, false),
        AccountMeta::new_readonly(vault_authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ]
}

pub fn withdraw(
    program_id: &Pubkey,
    holder: &Pubkey,
    asset_mint: &Pubkey,
    holder_token_account: &Pubkey,
    vault_token_account: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::Withdraw { amount },
        payout_accounts(program_id, holder, asset_mint, holder_token_account, vault_token_account),
    )
}

pub fn execute_withdrawal(
    program_id: &Pubkey,
    holder: &Pubkey,
    asset_mint: &Pubkey,
    holder_token_account: &Pubkey,
    vault_token_account: &Pubkey,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::ExecuteWithdrawal,
        payout_accounts(program_id, holder, asset_mint, holder_token_account, vault_token_account),
    )
}

pub fn emergency_withdraw(
    program_id: &Pubkey,
    holder: &Pubkey,
    asset_mint: &Pubkey,
    holder_token_account: &Pubkey,
    vault_token_account: &Pubkey,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::EmergencyWithdraw,
        payout_accounts(program_id, holder, asset_mint, holder_token_account, vault_token_account),
    )
}

pub fn claim_yield(
    program_id: &Pubkey,
    holder: &Pubkey,
    asset_mint: &Pubkey,
    holder_token_account: &Pubkey,
    vault_token_account: &Pubkey,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::ClaimYield,
        payout_accounts(program_id, holder, asset_mint, holder_token_account, vault_token_account),
    )
}

pub fn request_withdrawal(
    program_id: &Pubkey,
    holder: &Pubkey,
    asset_mint: &Pubkey,
    amount: u64,
) -> Instruction {
    let (ledger, _) = LedgerPDA::derive(program_id, asset_mint);
    let (holder_pda, _) = HolderPDA::derive(program_id, &ledger, holder);

    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::RequestWithdrawal { amount },
        vec![
            AccountMeta::new_readonly(*holder, true),
            AccountMeta::new_readonly(ledger, false),
            AccountMeta::new(holder_pda, false),
        ],
    )
}

/// Any role-gated instruction that only touches the ledger
pub fn ledger_admin(
    program_id: &Pubkey,
    authority: &Pubkey,
    asset_mint: &Pubkey,
    instruction: VaultInstruction,
) -> Instruction {
    let (ledger, _) = LedgerPDA::derive(program_id, asset_mint);

    Instruction::new_with_borsh(
        *program_id,
        &instruction,
        vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(ledger, false),
        ],
    )
}

pub fn migrate(
    program_id: &Pubkey,
    upgrade_authority: &Pubkey,
    asset_mint: &Pubkey,
    target: SchemaVersion,
) -> Instruction {
    ledger_admin(
        program_id,
        upgrade_authority,
        asset_mint,
        VaultInstruction::Migrate { target },
    )
}

pub fn migrate_holder(program_id: &Pubkey, asset_mint: &Pubkey, holder: &Pubkey) -> Instruction {
    let (ledger, _) = LedgerPDA::derive(program_id, asset_mint);
    let (holder_pda, _) = HolderPDA::derive(program_id, &ledger, holder);

    Instruction::new_with_borsh(
        *program_id,
        &VaultInstruction::MigrateHolder,
        vec![
            AccountMeta::new_readonly(ledger, false),
            AccountMeta::new(holder_pda, false),
        ],
    )
}
