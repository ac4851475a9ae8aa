//! SPL Token program CPI helpers

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
};

use spl_token::{instruction as token_instruction, state::Account as TokenAccount};

use crate::{capabilities::AssetTransfer, pda::seeds};

/// SPL Token program ID
pub const TOKEN_PROGRAM_ID: Pubkey = spl_token::ID;

/// Transfer SPL tokens, signing with `signer_seeds` when the authority is a PDA
pub fn transfer<'a>(
    source: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    authority: &AccountInfo<'a>,
    amount: u64,
    token_program: &AccountInfo<'a>,
    signer_seeds: &[&[&[u8]]],
) -> ProgramResult {
    if token_program.key != &TOKEN_PROGRAM_ID {
        return Err(ProgramError::IncorrectProgramId);
    }

    let instruction = token_instruction::transfer(
        &TOKEN_PROGRAM_ID,
        source.key,
        destination.key,
        authority.key,
        &[],
        amount,
    )?;

    let account_infos = [
        source.clone(),
        destination.clone(),
        authority.clone(),
        token_program.clone(),
    ];
    if signer_seeds.is_empty() {
        invoke(&instruction, &account_infos)
    } else {
        invoke_signed(&instruction, &account_infos, signer_seeds)
    }
}

/// Unpack a token account and check its mint and owner
pub fn verify_token_account(
    account: &AccountInfo,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<TokenAccount, ProgramError> {
    if account.owner != &TOKEN_PROGRAM_ID {
        msg!("Account {} is not owned by the token program", account.key);
        return Err(ProgramError::IncorrectProgramId);
    }

    let token_account = TokenAccount::unpack(&account.data.borrow())?;
    if token_account.mint != *mint {
        msg!("Token account {} has mint {}, expected {}", account.key, token_account.mint, mint);
        return Err(ProgramError::InvalidAccountData);
    }
    if token_account.owner != *owner {
        msg!(
            "Token account {} is owned by {}, expected {}",
            account.key,
            token_account.owner,
            owner
        );
        return Err(ProgramError::IllegalOwner);
    }

    Ok(token_account)
}

/// Custody for one holder: their token account on one side, the vault token
/// account on the other
pub struct SplTokenCustody<'a, 'b> {
    pub token_program: &'b AccountInfo<'a>,
    pub holder_owner: &'b AccountInfo<'a>,
    pub holder_token_account: &'b AccountInfo<'a>,
    pub vault_token_account: &'b AccountInfo<'a>,
    /// Only needed to pay out; deposits leave it unset
    pub vault_authority: Option<&'b AccountInfo<'a>>,
    pub ledger: Pubkey,
    pub vault_authority_bump: u8,
}

impl<'a, 'b> AssetTransfer for SplTokenCustody<'a, 'b> {
    fn transfer_in(&mut self, from: &Pubkey, amount: u64) -> ProgramResult {
        if from != self.holder_owner.key || !self.holder_owner.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        transfer(
            self.holder_token_account,
            self.vault_token_account,
            self.holder_owner,
            amount,
            self.token_program,
            &[],
        )
    }

    fn transfer_out(&mut self, to: &Pubkey, amount: u64) -> ProgramResult {
        if to != self.holder_owner.key {
            return Err(ProgramError::InvalidArgument);
        }
        let vault_authority = self.vault_authority.ok_or(ProgramError::NotEnoughAccountKeys)?;

        let bump = [self.vault_authority_bump];
        let signer_seeds: &[&[u8]] = &[seeds::VAULT_AUTHORITY, self.ledger.as_ref(), &bump];
        transfer(
            self.vault_token_account,
            self.holder_token_account,
            vault_authority,
            amount,
            self.token_program,
            &[signer_seeds],
        )
    }
}
