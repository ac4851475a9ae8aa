use crate::{constants::BPS_DENOMINATOR, error::VaultError};

/// Split of a gross deposit into retained fee and credited amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub fee: u64,
    pub net: u64,
}

/// fee = floor(amount * fee_bps / 10_000), net = amount - fee
pub fn compute_fee(amount: u64, fee_bps: u16) -> Result<FeeQuote, VaultError> {
    let fee = (amount as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(VaultError::ArithmeticOverflow)?
        / BPS_DENOMINATOR as u128;
    let fee = u64::try_from(fee).map_err(|_| VaultError::ArithmeticOverflow)?;
    let net = amount.checked_sub(fee).ok_or(VaultError::ArithmeticOverflow)?;

    Ok(FeeQuote { fee, net })
}
