//! Collaborator interfaces consumed by the ledger engine
//!
//! The engine never moves tokens or looks up permissions itself. It is handed
//! an [`AssetTransfer`] for custody movements and an [`AccessControl`] for
//! role checks, so the same accounting runs against SPL Token CPI on-chain and
//! against in-memory doubles in tests.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{entrypoint::ProgramResult, pubkey::Pubkey};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Fee, yield, pause, delay and role administration
    Admin,
    /// Schema migrations
    Upgrader,
}

pub trait AccessControl {
    fn has_role(&self, role: Role, principal: &Pubkey) -> bool;
}

/// Moves the ledger's single asset between a holder and the ledger's custody.
pub trait AssetTransfer {
    /// Pull `amount` from `from` into custody
    fn transfer_in(&mut self, from: &Pubkey, amount: u64) -> ProgramResult;

    /// Release `amount` from custody to `to`
    fn transfer_out(&mut self, to: &Pubkey, amount: u64) -> ProgramResult;
}
