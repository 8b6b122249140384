use anchor_lang::prelude::*;
use primitive_types::U256;

use crate::error::DscError;

/// `a * b / denominator` rounded down, with a 256-bit intermediate product.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
    require!(denominator != 0, DscError::MathOverflow);
    let quotient = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(DscError::MathOverflow)?
        / U256::from(denominator);
    u128::try_from(quotient).map_err(|_| error!(DscError::MathOverflow))
}

/// Like [`mul_div`] but clamps to `u128::MAX` instead of failing.
/// A zero denominator yields `u128::MAX`.
pub fn mul_div_saturating(a: u128, b: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        return u128::MAX;
    }
    // u128 * u128 always fits in 256 bits
    let quotient = U256::from(a).saturating_mul(U256::from(b)) / U256::from(denominator);
    u128::try_from(quotient).unwrap_or(u128::MAX)
}

pub fn pow10(exponent: u8) -> Result<u128> {
    10u128
        .checked_pow(u32::from(exponent))
        .ok_or_else(|| error!(DscError::MathOverflow))
}

pub fn to_u64(amount: u128) -> Result<u64> {
    u64::try_from(amount).map_err(|_| error!(DscError::MathOverflow))
}

/// Convert an 18-decimal ledger amount into mint units, refusing to drop dust.
pub fn to_mint_units(amount: u128, scale: u128) -> Result<u64> {
    require!(scale != 0, DscError::MathOverflow);
    require!(amount % scale == 0, DscError::AmountNotRepresentable);
    to_u64(amount / scale)
}

/// Lift mint units into the 18-decimal ledger scale.
pub fn from_mint_units(amount: u64, scale: u128) -> Result<u128> {
    u128::from(amount)
        .checked_mul(scale)
        .ok_or_else(|| error!(DscError::MathOverflow))
}
