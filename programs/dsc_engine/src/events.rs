use anchor_lang::prelude::*;

#[event]
pub struct CollateralDeposited {
    pub user: Pubkey,
    pub asset: Pubkey,
    pub amount: u128,
}

#[event]
pub struct CollateralRedeemed {
    pub redeemed_from: Pubkey,
    pub redeemed_to: Pubkey,
    pub asset: Pubkey,
    pub amount: u128,
}

#[event]
pub struct StableMinted {
    pub user: Pubkey,
    pub amount: u128,
    pub total_dsc_minted: u128,
}

#[event]
pub struct StableBurned {
    pub on_behalf_of: Pubkey,
    pub payer: Pubkey,
    pub amount: u128,
    pub total_dsc_minted: u128,
}

#[event]
pub struct Liquidated {
    pub liquidator: Pubkey,
    pub user: Pubkey,
    pub asset: Pubkey,
    pub debt_covered: u128,
    /// Collateral moved to the liquidator, bonus included.
    pub collateral_seized: u128,
    pub bonus_collateral: u128,
    pub starting_health_factor: u128,
    pub ending_health_factor: u128,
    pub timestamp: i64,
}
