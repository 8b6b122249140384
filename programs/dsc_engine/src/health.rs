use crate::constants::{
    LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR, PRECISION,
};
use crate::math::mul_div_saturating;

/// Collateral value that counts toward solvency.
pub fn adjusted_collateral(collateral_value_in_usd: u128) -> u128 {
    mul_div_saturating(
        collateral_value_in_usd,
        LIQUIDATION_THRESHOLD,
        LIQUIDATION_PRECISION,
    )
}

/// Solvency margin scaled by `PRECISION`; `u128::MAX` when nothing is owed.
///
/// Total over all inputs: zero debt short-circuits and oversized results
/// saturate at the same sentinel.
pub fn calculate_health_factor(total_dsc_minted: u128, collateral_value_in_usd: u128) -> u128 {
    if total_dsc_minted == 0 {
        return u128::MAX;
    }
    mul_div_saturating(
        adjusted_collateral(collateral_value_in_usd),
        PRECISION,
        total_dsc_minted,
    )
}

/// Stable units of debt not backed by threshold-adjusted collateral.
pub fn collateral_shortfall(total_dsc_minted: u128, collateral_value_in_usd: u128) -> u128 {
    total_dsc_minted.saturating_sub(adjusted_collateral(collateral_value_in_usd))
}

pub fn is_healthy(health_factor: u128) -> bool {
    health_factor >= MIN_HEALTH_FACTOR
}
