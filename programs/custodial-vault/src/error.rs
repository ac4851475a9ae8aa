use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum VaultError {
    #[error("Invalid argument")]
    InvalidArgument = 0,

    #[error("Amount must be greater than zero")]
    InvalidAmount = 1,

    #[error("Insufficient balance")]
    InsufficientBalance = 2,

    #[error("Holder has no balance")]
    NoBalance = 3,

    #[error("Holder has never deposited")]
    NoDeposits = 4,

    #[error("Unauthorized")]
    Unauthorized = 5,

    #[error("Already initialized")]
    AlreadyInitialized = 6,

    #[error("Not initialized")]
    NotInitialized = 7,

    #[error("Schema version already migrated")]
    AlreadyMigrated = 8,

    #[error("Migration must advance exactly one schema version")]
    MigrationOutOfOrder = 9,

    #[error("Insufficient reserved extension space")]
    InsufficientReservedSpace = 10,

    #[error("Operation not supported at the current schema version")]
    UnsupportedSchemaVersion = 11,

    #[error("Deposits are paused")]
    DepositsPaused = 12,

    #[error("Withdrawal request already pending")]
    RequestAlreadyPending = 13,

    #[error("No pending withdrawal")]
    NoPendingWithdrawal = 14,

    #[error("Withdrawal delay not elapsed")]
    DelayNotElapsed = 15,

    #[error("Asset transfer failed")]
    TransferFailed = 16,

    #[error("Nothing to claim")]
    NothingToClaim = 17,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 18,

    #[error("Invalid PDA")]
    InvalidPDA = 19,

    #[error("Invalid account data")]
    InvalidAccountData = 20,
}

impl PrintProgramError for VaultError {
    fn print<E>(&self) {
        use solana_program::msg;
        msg!("VaultError: {}", self);
    }
}

impl From<VaultError> for ProgramError {
    fn from(e: VaultError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for VaultError {
    fn type_of() -> &'static str {
        "VaultError"
    }
}
