//! Event logging for the vault ledger
//!
//! Each event is a borsh record tagged with an [`EventType`]. `emit` writes a
//! marker line, the type and the bs58-encoded payload to the program log so
//! indexers can rebuild holder histories from transaction logs.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::state::SchemaVersion;

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq)]
pub enum EventType {
    // Lifecycle events
    LedgerInitialized = 1,
    SchemaMigrated = 2,
    HolderMigrated = 3,

    // Holder events
    Deposited = 10,
    Withdrawn = 11,
    WithdrawalRequested = 12,
    WithdrawalExecuted = 13,
    EmergencyWithdrawn = 14,
    YieldClaimed = 15,

    // Admin events
    YieldRateUpdated = 20,
    WithdrawalDelayUpdated = 21,
    DepositsPauseToggled = 22,
    RolesUpdated = 23,
}

/// Base event trait
pub trait Event: BorshSerialize {
    fn event_type() -> EventType;

    fn emit(&self) {
        msg!("VAULT_EVENT");
        msg!("TYPE:{:?}", Self::event_type());

        if let Ok(data) = self.try_to_vec() {
            msg!("DATA:{}", bs58::encode(&data).into_string());
        }
    }
}

#[macro_export]
macro_rules! define_event {
    ($name:ident { $($field:ident: $type:ty),* $(,)? }) => {
        #[derive(::borsh::BorshSerialize, ::borsh::BorshDeserialize, Debug, Clone, PartialEq)]
        pub struct $name {
            $(pub $field: $type,)*
        }

        impl $crate::events::Event for $name {
            fn event_type() -> $crate::events::EventType {
                $crate::events::EventType::$name
            }
        }
    };
}

define_event!(LedgerInitialized {
    ledger: Pubkey,
    asset_mint: Pubkey,
    admin: Pubkey,
    deposit_fee_bps: u16,
});

define_event!(SchemaMigrated {
    from: SchemaVersion,
    to: SchemaVersion,
    ledger_budget_remaining: u16,
    holder_budget_remaining: u16,
});

define_event!(HolderMigrated {
    holder: Pubkey,
    from: SchemaVersion,
    to: SchemaVersion,
});

define_event!(Deposited {
    holder: Pubkey,
    net: u64,
    fee: u64,
});

define_event!(Withdrawn {
    holder: Pubkey,
    amount: u64,
});

define_event!(WithdrawalRequested {
    holder: Pubkey,
    amount: u64,
    requested_at: UnixTimestamp,
    available_at: UnixTimestamp,
});

define_event!(WithdrawalExecuted {
    holder: Pubkey,
    amount: u64,
});

define_event!(EmergencyWithdrawn {
    holder: Pubkey,
    amount: u64,
    cancelled_request: Option<u64>,
});

define_event!(YieldClaimed {
    holder: Pubkey,
    amount: u64,
    cumulative_claimed: u64,
});

define_event!(YieldRateUpdated {
    old_bps: u16,
    new_bps: u16,
});

define_event!(WithdrawalDelayUpdated {
    old_seconds: u64,
    new_seconds: u64,
});

define_event!(DepositsPauseToggled {
    paused: bool,
    caller: Pubkey,
});

define_event!(RolesUpdated {
    admin: Pubkey,
    upgrade_authority: Pubkey,
});
