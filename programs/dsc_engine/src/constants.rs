// ========== PROTOCOL CONSTANTS ==========
/// Share of collateral value that counts toward solvency (50% → 200% collateralization)
pub const LIQUIDATION_THRESHOLD: u128 = 50;

/// Denominator of `LIQUIDATION_THRESHOLD` and `LIQUIDATION_BONUS`
pub const LIQUIDATION_PRECISION: u128 = 100;

/// Extra collateral paid to liquidators (10%)
pub const LIQUIDATION_BONUS: u128 = 10;

/// Fixed-point scale of USD values, stable units and health factors
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Scale that lifts an 8-decimal feed price to `PRECISION`
pub const ADDITIONAL_FEED_PRECISION: u128 = 10_000_000_000;

/// Health factor below which a position can be liquidated
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

/// Decimals of stable-unit ledger amounts
pub const STABLE_DECIMALS: u8 = 18;

/// Prices older than this are refused (3 hours)
pub const DEFAULT_MAX_PRICE_AGE: i64 = 3 * 60 * 60;

/// Upper bound on registered collateral assets (sizes the config account)
pub const MAX_COLLATERAL_ASSETS: usize = 10;

// ========== PDA SEEDS ==========
pub const ENGINE_SEED: &[u8] = b"engine";
pub const LEDGER_SEED: &[u8] = b"ledger";
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";
