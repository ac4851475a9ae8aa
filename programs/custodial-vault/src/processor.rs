use solana_program::{
    account_info::{next_account_info, AccountInfo},
    bpf_loader_upgradeable::{self, UpgradeableLoaderState},
    clock::{Clock, UnixTimestamp},
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    program_utils::limited_deserialize,
    pubkey::Pubkey,
    sysvar::Sysvar,
};

use crate::{
    cpi::{spl_token::verify_token_account, system_program::create_pda_account, SplTokenCustody},
    engine::{InitializeParams, VaultEngine},
    error::VaultError,
    events::{Event, LedgerInitialized},
    instruction::VaultInstruction,
    pda::{seeds, validate_pda_derivation, ProgramDataPDA},
    state::{HolderAccount, Ledger},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = VaultInstruction::unpack(instruction_data)?;

        match instruction {
            VaultInstruction::Initialize {
                admin,
                deposit_fee_bps,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, admin, deposit_fee_bps)
            }
            VaultInstruction::Deposit { amount } => {
                msg!("Instruction: Deposit");
                Self::process_deposit(program_id, accounts, amount)
            }
            VaultInstruction::Withdraw { amount } => {
                msg!("Instruction: Withdraw");
                Self::process_payout(program_id, accounts, |ledger, holder, custody, now| {
                    VaultEngine::withdraw(ledger, holder, custody, amount, now).map(|_| ())
                })
            }
            VaultInstruction::RequestWithdrawal { amount } => {
                msg!("Instruction: RequestWithdrawal");
                Self::process_request_withdrawal(program_id, accounts, amount)
            }
            VaultInstruction::ExecuteWithdrawal => {
                msg!("Instruction: ExecuteWithdrawal");
                Self::process_payout(program_id, accounts, |ledger, holder, custody, now| {
                    VaultEngine::execute_withdrawal(ledger, holder, custody, now).map(|_| ())
                })
            }
            VaultInstruction::EmergencyWithdraw => {
                msg!("Instruction: EmergencyWithdraw");
                Self::process_payout(program_id, accounts, |ledger, holder, custody, _| {
                    VaultEngine::emergency_withdraw(ledger, holder, custody).map(|_| ())
                })
            }
            VaultInstruction::ClaimYield => {
                msg!("Instruction: ClaimYield");
                Self::process_payout(program_id, accounts, |ledger, holder, custody, now| {
                    VaultEngine::claim_yield(ledger, holder, custody, now).map(|_| ())
                })
            }
            VaultInstruction::SetYieldRate { bps } => {
                msg!("Instruction: SetYieldRate");
                Self::process_ledger_admin(program_id, accounts, |ledger, caller| {
                    let roles = ledger.roles;
                    VaultEngine::set_yield_rate(ledger, &roles, caller, bps)
                })
            }
            VaultInstruction::SetWithdrawalDelay { seconds } => {
                msg!("Instruction: SetWithdrawalDelay");
                Self::process_ledger_admin(program_id, accounts, |ledger, caller| {
                    let roles = ledger.roles;
                    VaultEngine::set_withdrawal_delay(ledger, &roles, caller, seconds)
                })
            }
            VaultInstruction::PauseDeposits => {
                msg!("Instruction: PauseDeposits");
                Self::process_ledger_admin(program_id, accounts, |ledger, caller| {
                    let roles = ledger.roles;
                    VaultEngine::pause_deposits(ledger, &roles, caller)
                })
            }
            VaultInstruction::UnpauseDeposits => {
                msg!("Instruction: UnpauseDeposits");
                Self::process_ledger_admin(program_id, accounts, |ledger, caller| {
                    let roles = ledger.roles;
                    VaultEngine::unpause_deposits(ledger, &roles, caller)
                })
            }
            VaultInstruction::Migrate { target } => {
                msg!("Instruction: Migrate");
                Self::process_ledger_admin(program_id, accounts, |ledger, caller| {
                    let roles = ledger.roles;
                    VaultEngine::migrate(ledger, &roles, caller, target).map(|_| ())
                })
            }
            VaultInstruction::MigrateHolder => {
                msg!("Instruction: MigrateHolder");
                Self::process_migrate_holder(program_id, accounts)
            }
            VaultInstruction::UpdateRoles {
                admin,
                upgrade_authority,
            } => {
                msg!("Instruction: UpdateRoles");
                Self::process_ledger_admin(program_id, accounts, |ledger, caller| {
                    let roles = ledger.roles;
                    VaultEngine::update_roles(ledger, &roles, caller, admin, upgrade_authority)
                })
            }
        }
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        admin: Pubkey,
        deposit_fee_bps: u16,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer = next_account_info(account_info_iter)?;
        let ledger_account = next_account_info(account_info_iter)?;
        let asset_mint = next_account_info(account_info_iter)?;
        let vault_token_account = next_account_info(account_info_iter)?;
        let vault_authority = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;
        let program_data = next_account_info(account_info_iter)?;

        require_signer(payer)?;
        require_upgrade_authority(program_id, program_data, payer)?;

        let bump = validate_pda_derivation(
            ledger_account.key,
            program_id,
            &[seeds::LEDGER, asset_mint.key.as_ref()],
        )?;
        let vault_authority_bump = validate_pda_derivation(
            vault_authority.key,
            program_id,
            &[seeds::VAULT_AUTHORITY, ledger_account.key.as_ref()],
        )?;

        let existing = if ledger_account.owner == program_id
            && Ledger::is_initialized_data(&ledger_account.data.borrow())
        {
            Some(Ledger::unpack(&ledger_account.data.borrow())?)
        } else {
            None
        };

        // Custody must sit with the vault authority before anything can be deposited
        verify_token_account(vault_token_account, asset_mint.key, vault_authority.key)?;

        let ledger = VaultEngine::initialize(
            existing.as_ref(),
            InitializeParams {
                bump,
                vault_authority_bump,
                asset_mint: *asset_mint.key,
                vault_token_account: *vault_token_account.key,
                admin,
                deposit_fee_bps,
            },
        )?;

        if ledger_account.data_is_empty() {
            create_pda_account(
                payer,
                ledger_account,
                Ledger::LEN,
                program_id,
                system_program,
                &[seeds::LEDGER, asset_mint.key.as_ref(), &[bump]],
            )?;
        } else if ledger_account.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        ledger.pack(&mut ledger_account.data.borrow_mut())?;

        LedgerInitialized {
            ledger: *ledger_account.key,
            asset_mint: ledger.asset_mint,
            admin,
            deposit_fee_bps,
        }
        .emit();

        msg!("Ledger initialized for {} with fee {} bps", asset_mint.key, deposit_fee_bps);

        Ok(())
    }

    fn process_deposit(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner = next_account_info(account_info_iter)?;
        let ledger_account = next_account_info(account_info_iter)?;
        let holder_account = next_account_info(account_info_iter)?;
        let holder_token_account = next_account_info(account_info_iter)?;
        let vault_token_account = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;

        require_signer(owner)?;

        let mut ledger = load_ledger(program_id, ledger_account)?;
        check_vault_token_account(&ledger, vault_token_account)?;
        verify_token_account(holder_token_account, &ledger.asset_mint, owner.key)?;

        let holder_bump = validate_pda_derivation(
            holder_account.key,
            program_id,
            &[seeds::HOLDER, ledger_account.key.as_ref(), owner.key.as_ref()],
        )?;

        // First deposit creates the record at the ledger's current version
        let mut holder = if holder_account.data_is_empty() {
            create_pda_account(
                owner,
                holder_account,
                HolderAccount::LEN,
                program_id,
                system_program,
                &[
                    seeds::HOLDER,
                    ledger_account.key.as_ref(),
                    owner.key.as_ref(),
                    &[holder_bump],
                ],
            )?;
            HolderAccount::new(*owner.key, holder_bump, ledger.schema_version)?
        } else {
            load_holder(program_id, ledger_account.key, holder_account, owner.key)?
        };

        let mut custody = SplTokenCustody {
            token_program,
            holder_owner: owner,
            holder_token_account,
            vault_token_account,
            vault_authority: None,
            ledger: *ledger_account.key,
            vault_authority_bump: ledger.vault_authority_bump,
        };

        let now = Clock::get()?.unix_timestamp;
        let quote = VaultEngine::deposit(&mut ledger, &mut holder, &mut custody, amount, now)?;

        ledger.pack(&mut ledger_account.data.borrow_mut())?;
        holder.pack(&mut holder_account.data.borrow_mut())?;

        msg!("Deposited {} (fee {}), balance {}", quote.net, quote.fee, holder.balance);

        Ok(())
    }

    /// Shared account handling for every instruction that can release custody
    fn process_payout<'a, 'b, F>(
        program_id: &Pubkey,
        accounts: &'b [AccountInfo<'a>],
        op: F,
    ) -> ProgramResult
    where
        F: FnOnce(
            &mut Ledger,
            &mut HolderAccount,
            &mut SplTokenCustody<'a, 'b>,
            UnixTimestamp,
        ) -> Result<(), VaultError>,
    {
        let account_info_iter = &mut accounts.iter();
        let owner = next_account_info(account_info_iter)?;
        let ledger_account = next_account_info(account_info_iter)?;
        let holder_account = next_account_info(account_info_iter)?;
        let holder_token_account = next_account_info(account_info_iter)?;
        let vault_token_account = next_account_info(account_info_iter)?;
        let vault_authority = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        require_signer(owner)?;

        let mut ledger = load_ledger(program_id, ledger_account)?;
        let mut holder = load_holder(program_id, ledger_account.key, holder_account, owner.key)?;
        check_vault_token_account(&ledger, vault_token_account)?;
        verify_token_account(holder_token_account, &ledger.asset_mint, owner.key)?;

        let vault_authority_bump = validate_pda_derivation(
            vault_authority.key,
            program_id,
            &[seeds::VAULT_AUTHORITY, ledger_account.key.as_ref()],
        )?;
        if vault_authority_bump != ledger.vault_authority_bump {
            return Err(VaultError::InvalidPDA.into());
        }

        let mut custody = SplTokenCustody {
            token_program,
            holder_owner: owner,
            holder_token_account,
            vault_token_account,
            vault_authority: Some(vault_authority),
            ledger: *ledger_account.key,
            vault_authority_bump,
        };

        let now = Clock::get()?.unix_timestamp;
        op(&mut ledger, &mut holder, &mut custody, now)?;

        ledger.pack(&mut ledger_account.data.borrow_mut())?;
        holder.pack(&mut holder_account.data.borrow_mut())?;

        Ok(())
    }

    fn process_request_withdrawal(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner = next_account_info(account_info_iter)?;
        let ledger_account = next_account_info(account_info_iter)?;
        let holder_account = next_account_info(account_info_iter)?;

        require_signer(owner)?;

        let mut ledger = load_ledger(program_id, ledger_account)?;
        let mut holder = load_holder(program_id, ledger_account.key, holder_account, owner.key)?;

        let now = Clock::get()?.unix_timestamp;
        let request = VaultEngine::request_withdrawal(&mut ledger, &mut holder, amount, now)?;

        holder.pack(&mut holder_account.data.borrow_mut())?;

        msg!("Withdrawal of {} available at {}", request.amount, request.available_at());

        Ok(())
    }

    /// Role-gated instructions that only touch the ledger record
    fn process_ledger_admin<F>(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        op: F,
    ) -> ProgramResult
    where
        F: FnOnce(&mut Ledger, &Pubkey) -> Result<(), VaultError>,
    {
        let account_info_iter = &mut accounts.iter();
        let authority = next_account_info(account_info_iter)?;
        let ledger_account = next_account_info(account_info_iter)?;

        require_signer(authority)?;

        let mut ledger = load_ledger(program_id, ledger_account)?;
        op(&mut ledger, authority.key)?;
        ledger.pack(&mut ledger_account.data.borrow_mut())?;

        Ok(())
    }

    fn process_migrate_holder(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let ledger_account = next_account_info(account_info_iter)?;
        let holder_account = next_account_info(account_info_iter)?;

        let ledger = load_ledger(program_id, ledger_account)?;

        if holder_account.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        let owner = HolderAccount::unpack(&holder_account.data.borrow())?.owner;
        let mut holder = load_holder(program_id, ledger_account.key, holder_account, &owner)?;

        VaultEngine::migrate_holder(&ledger, &mut holder)?;
        holder.pack(&mut holder_account.data.borrow_mut())?;

        msg!("Holder {} migrated to {:?}", owner, ledger.schema_version);

        Ok(())
    }
}

fn require_signer(account: &AccountInfo) -> ProgramResult {
    if !account.is_signer {
        msg!("{} must sign", account.key);
        return Err(ProgramError::MissingRequiredSignature);
    }
    Ok(())
}

/// Only the program's upgrade authority may open a ledger and pick its roles
fn require_upgrade_authority(
    program_id: &Pubkey,
    program_data: &AccountInfo,
    authority: &AccountInfo,
) -> ProgramResult {
    if *program_data.key != ProgramDataPDA::derive(program_id)
        || *program_data.owner != bpf_loader_upgradeable::id()
    {
        msg!("Invalid program data account: {}", program_data.key);
        return Err(VaultError::InvalidAccountData.into());
    }

    let data = program_data.data.borrow();
    let metadata = data
        .get(..UpgradeableLoaderState::size_of_programdata_metadata())
        .ok_or(ProgramError::InvalidAccountData)?;

    match limited_deserialize::<UpgradeableLoaderState>(metadata, metadata.len() as u64) {
        Ok(UpgradeableLoaderState::ProgramData {
            upgrade_authority_address: Some(upgrade_authority),
            ..
        }) if upgrade_authority == *authority.key => Ok(()),
        Ok(UpgradeableLoaderState::ProgramData { .. }) => {
            msg!("{} is not the program upgrade authority", authority.key);
            Err(VaultError::Unauthorized.into())
        }
        _ => Err(ProgramError::InvalidAccountData),
    }
}

fn load_ledger(program_id: &Pubkey, ledger_account: &AccountInfo) -> Result<Ledger, ProgramError> {
    if ledger_account.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    if !Ledger::is_initialized_data(&ledger_account.data.borrow()) {
        return Err(VaultError::NotInitialized.into());
    }

    let ledger = Ledger::unpack(&ledger_account.data.borrow())?;
    validate_pda_derivation(
        ledger_account.key,
        program_id,
        &[seeds::LEDGER, ledger.asset_mint.as_ref()],
    )?;

    Ok(ledger)
}

fn load_holder(
    program_id: &Pubkey,
    ledger_key: &Pubkey,
    holder_account: &AccountInfo,
    owner: &Pubkey,
) -> Result<HolderAccount, ProgramError> {
    if holder_account.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    validate_pda_derivation(
        holder_account.key,
        program_id,
        &[seeds::HOLDER, ledger_key.as_ref(), owner.as_ref()],
    )?;

    let holder = HolderAccount::unpack(&holder_account.data.borrow())?;
    if holder.owner != *owner {
        return Err(VaultError::Unauthorized.into());
    }

    Ok(holder)
}

fn check_vault_token_account(ledger: &Ledger, vault_token_account: &AccountInfo) -> ProgramResult {
    if *vault_token_account.key != ledger.vault_token_account {
        msg!("Vault token account mismatch: {}", vault_token_account.key);
        return Err(VaultError::InvalidAccountData.into());
    }
    Ok(())
}
