use anchor_lang::prelude::*;

use crate::constants::{MAX_COLLATERAL_ASSETS, STABLE_DECIMALS};
use crate::engine::{DscEngine, EngineParams};
use crate::error::DscError;
use crate::math::pow10;
use crate::registry::{CollateralAsset, TokenRegistry};

/// Engine configuration, written once by `initialize_engine`.
#[account]
pub struct EngineConfig {
    pub stable_mint: Pubkey,
    pub stable_decimals: u8,
    pub max_price_age: i64,
    /// Only feeds pushed by this key are trusted.
    pub feed_authority: Pubkey,
    /// Registered collateral in registration order.
    pub collateral_assets: Vec<CollateralAsset>,
    pub bump: u8,
    pub vault_authority_bump: u8,
}

impl EngineConfig {
    pub const LEN: usize =
        32 + 1 + 8 + 32 + (4 + CollateralAsset::LEN * MAX_COLLATERAL_ASSETS) + 1 + 1;

    pub fn registry(&self) -> Result<TokenRegistry> {
        TokenRegistry::from_entries(self.collateral_assets.clone())
    }

    pub fn params(&self) -> EngineParams {
        EngineParams {
            stable_mint: self.stable_mint,
            max_price_age: self.max_price_age,
        }
    }

    /// Ledger units per stable mint unit.
    pub fn stable_scale(&self) -> Result<u128> {
        require!(
            self.stable_decimals <= STABLE_DECIMALS,
            DscError::UnsupportedDecimals
        );
        pow10(STABLE_DECIMALS - self.stable_decimals)
    }

    pub fn engine(&self) -> Result<DscEngine> {
        Ok(DscEngine::with_registry(self.registry()?, self.params()))
    }
}

/// One user's slice of both ledgers. `collateral` follows registry order.
#[account]
pub struct UserLedger {
    pub owner: Pubkey,
    pub dsc_minted: u128,
    pub collateral: Vec<u128>,
    pub bump: u8,
}

impl UserLedger {
    pub const LEN: usize = 32 + 16 + (4 + 16 * MAX_COLLATERAL_ASSETS) + 1;

    /// Claim a freshly created ledger for `owner`, or check an existing one.
    pub fn prepare(&mut self, owner: Pubkey, bump: u8, asset_count: usize) -> Result<()> {
        if self.owner == Pubkey::default() {
            self.owner = owner;
            self.bump = bump;
            self.dsc_minted = 0;
            self.collateral = vec![0; asset_count];
        }
        require_keys_eq!(self.owner, owner, DscError::LedgerMismatch);
        require!(
            self.collateral.len() == asset_count,
            DscError::LedgerMismatch
        );
        Ok(())
    }

    pub fn load_into(&self, engine: &mut DscEngine) -> Result<()> {
        engine.load_position(self.owner, self.dsc_minted, &self.collateral)
    }

    pub fn store_from(&mut self, engine: &DscEngine) {
        let (dsc_minted, collateral) = engine.export_position(&self.owner);
        self.dsc_minted = dsc_minted;
        self.collateral = collateral;
    }
}
