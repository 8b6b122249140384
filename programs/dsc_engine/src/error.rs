use anchor_lang::prelude::*;

#[error_code]
pub enum DscError {
    // Input validation
    #[msg("Amount must be more than zero")]
    NeedsMoreThanZero,
    #[msg("Token addresses and price feed addresses must be the same length")]
    TokenAddressesAndPriceFeedAddressesMustBeSameLength,
    #[msg("Token is not an allowed collateral asset")]
    NotAllowedToken,
    #[msg("Collateral asset registered twice")]
    DuplicateCollateralAsset,
    #[msg("Too many collateral assets")]
    TooManyCollateralAssets,
    #[msg("Token decimals are not supported")]
    UnsupportedDecimals,
    #[msg("Collateral mint account does not match the registered asset")]
    CollateralMintMismatch,
    #[msg("User ledger does not match the collateral registry")]
    LedgerMismatch,
    #[msg("Liquidator cannot liquidate their own position")]
    SelfLiquidation,
    #[msg("Stable mint authority must be the engine vault authority")]
    StableMintAuthorityMismatch,

    // Solvency
    #[msg("Operation breaks the health factor")]
    BreaksHealthFactor,
    #[msg("Health factor is ok, position cannot be liquidated")]
    HealthFactorOk,
    #[msg("Liquidation left the position more undercollateralized")]
    HealthFactorNotImproved,
    #[msg("Debt to cover exceeds the outstanding debt")]
    DebtToCoverExceedsDebt,
    #[msg("Collateral in this asset cannot fund the debt plus liquidation bonus")]
    InsufficientCollateralForLiquidation,

    // Arithmetic
    #[msg("Insufficient collateral balance")]
    InsufficientCollateral,
    #[msg("Burn amount exceeds minted debt")]
    InsufficientDebt,
    #[msg("Overflow during math operation")]
    MathOverflow,
    #[msg("Amount cannot be represented in token units")]
    AmountNotRepresentable,

    // External interactions
    #[msg("Token transfer failed")]
    TransferFailed,
    #[msg("Stable unit mint failed")]
    MintFailed,

    // Oracle
    #[msg("Oracle price is stale")]
    StalePrice,
    #[msg("Invalid oracle price")]
    InvalidPrice,
    #[msg("Price feed account missing or not owned by the price feed program")]
    PriceFeedMismatch,

    // Concurrency
    #[msg("Reentrant call into the engine")]
    Reentrancy,
}
