use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::capabilities::{AccessControl, Role};

/// Role table persisted inside the ledger record
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleAssignments {
    pub admin: Pubkey,
    pub upgrade_authority: Pubkey,
}

impl RoleAssignments {
    pub const LEN: usize = 32 + 32;

    /// Initial table: the admin also holds the upgrade role
    pub fn new(admin: Pubkey) -> Self {
        Self {
            admin,
            upgrade_authority: admin,
        }
    }
}

impl AccessControl for RoleAssignments {
    fn has_role(&self, role: Role, principal: &Pubkey) -> bool {
        if *principal == Pubkey::default() {
            return false;
        }
        match role {
            Role::Admin => self.admin == *principal,
            Role::Upgrader => self.upgrade_authority == *principal,
        }
    }
}
