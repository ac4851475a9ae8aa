pub mod schema;
pub mod roles;
pub mod ledger;
pub mod holder_account;

pub use schema::*;
pub use roles::*;
pub use ledger::*;
pub use holder_account::*;

use borsh::BorshDeserialize;
use solana_program::program_error::ProgramError;

/// Deserialize a fixed-size record without requiring the reserved tail to be consumed
pub fn borsh_deserialize_unchecked<T: BorshDeserialize>(data: &[u8]) -> Result<T, ProgramError> {
    let mut cursor: &[u8] = data;
    T::deserialize(&mut cursor).map_err(|_| ProgramError::InvalidAccountData)
}
