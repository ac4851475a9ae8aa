// Upgradeable custodial vault ledger
// Native Solana implementation - NO ANCHOR

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    pubkey::Pubkey,
};

pub mod capabilities;
pub mod constants;
pub mod cpi;
pub mod engine;
pub mod error;
pub mod events;
pub mod instruction;
pub mod pda;
pub mod processor;
pub mod state;

use crate::processor::Processor;

// Declare program ID
solana_program::declare_id!("VauLt11111111111111111111111111111111111111");

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    Processor::process(program_id, accounts, instruction_data)
}
