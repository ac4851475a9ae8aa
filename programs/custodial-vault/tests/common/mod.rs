#![allow(dead_code)]

use std::collections::BTreeMap;

use custodial_vault::{
    capabilities::AssetTransfer,
    engine::{InitializeParams, VaultEngine},
    state::{HolderAccount, Ledger, SchemaVersion},
};
use solana_program::{
    clock::UnixTimestamp, entrypoint::ProgramResult, program_error::ProgramError, pubkey::Pubkey,
};

pub const T0: UnixTimestamp = 1_700_000_000;
pub const DAY: i64 = 86_400;

/// In-memory custody that can be told to reject the next transfer
#[derive(Default, Debug)]
pub struct TestAsset {
    pub custody: u64,
    pub wallets: BTreeMap<Pubkey, u64>,
    pub fail_next: bool,
}

impl TestAsset {
    pub fn wallet(&self, owner: &Pubkey) -> u64 {
        self.wallets.get(owner).copied().unwrap_or_default()
    }
}

impl AssetTransfer for TestAsset {
    fn transfer_in(&mut self, from: &Pubkey, amount: u64) -> ProgramResult {
        if std::mem::take(&mut self.fail_next) {
            return Err(ProgramError::Custom(0xdead));
        }
        let wallet = self.wallets.entry(*from).or_default();
        *wallet = wallet.checked_sub(amount).ok_or(ProgramError::InsufficientFunds)?;
        self.custody += amount;
        Ok(())
    }

    fn transfer_out(&mut self, to: &Pubkey, amount: u64) -> ProgramResult {
        if std::mem::take(&mut self.fail_next) || amount > self.custody {
            return Err(ProgramError::InsufficientFunds);
        }
        self.custody -= amount;
        *self.wallets.entry(*to).or_default() += amount;
        Ok(())
    }
}

/// A ledger, its holders and custody, driven through the engine
pub struct TestVault {
    pub admin: Pubkey,
    pub ledger: Ledger,
    pub holders: Vec<HolderAccount>,
    pub asset: TestAsset,
    pub now: UnixTimestamp,
}

impl TestVault {
    pub fn new(deposit_fee_bps: u16) -> Self {
        let admin = Pubkey::new_unique();
        let ledger = VaultEngine::initialize(
            None,
            InitializeParams {
                bump: 255,
                vault_authority_bump: 255,
                asset_mint: Pubkey::new_unique(),
                vault_token_account: Pubkey::new_unique(),
                admin,
                deposit_fee_bps,
            },
        )
        .unwrap();

        Self {
            admin,
            ledger,
            holders: Vec::new(),
            asset: TestAsset::default(),
            now: T0,
        }
    }

    /// Add a holder with `funds` in their wallet; returns its index
    pub fn add_holder(&mut self, funds: u64) -> usize {
        let owner = Pubkey::new_unique();
        self.asset.wallets.insert(owner, funds);
        self.holders
            .push(HolderAccount::new(owner, 254, self.ledger.schema_version).unwrap());
        self.holders.len() - 1
    }

    pub fn owner(&self, holder: usize) -> Pubkey {
        self.holders[holder].owner
    }

    pub fn migrate_to(&mut self, target: SchemaVersion) {
        while self.ledger.schema_version < target {
            let next = self.ledger.schema_version.next().unwrap();
            let roles = self.ledger.roles;
            VaultEngine::migrate(&mut self.ledger, &roles, &self.admin, next).unwrap();
        }
    }

    pub fn set_yield_rate(&mut self, bps: u16) {
        let roles = self.ledger.roles;
        VaultEngine::set_yield_rate(&mut self.ledger, &roles, &self.admin, bps).unwrap();
    }

    pub fn set_withdrawal_delay(&mut self, seconds: u64) {
        let roles = self.ledger.roles;
        VaultEngine::set_withdrawal_delay(&mut self.ledger, &roles, &self.admin, seconds).unwrap();
    }

    pub fn conserved(&self) -> bool {
        VaultEngine::conservation_holds(&self.ledger, self.holders.iter())
    }
}
