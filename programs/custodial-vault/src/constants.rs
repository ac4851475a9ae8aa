//! Ledger-wide constants

/// Basis point denominator (10_000 bps = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound for any bps-denominated rate
pub const MAX_BPS: u16 = 10_000;

/// 365 * 24 * 3600
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Reserved bytes appended to the ledger record at V1
pub const LEDGER_EXTENSION_BYTES: u16 = 64;

/// Reserved bytes appended to every holder record at V1
pub const HOLDER_EXTENSION_BYTES: u16 = 48;
