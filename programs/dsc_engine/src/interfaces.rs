use anchor_lang::prelude::*;

use crate::error::DscError;
use crate::valuation::PriceOracle;

/// Custody of collateral tokens. Amounts are in the asset's native units.
pub trait CollateralVault {
    /// Pull `amount` of `asset` from `from` into engine custody.
    fn transfer_in(&mut self, asset: &Pubkey, from: &Pubkey, amount: u128) -> Result<()>;

    /// Release `amount` of `asset` from engine custody to `to`.
    fn transfer_out(&mut self, asset: &Pubkey, to: &Pubkey, amount: u128) -> Result<()>;
}

/// The stable-unit token. Amounts are 18-decimal ledger units.
pub trait StableUnitGateway {
    fn mint(&mut self, to: &Pubkey, amount: u128) -> Result<()>;

    /// Move `amount` from `from` into engine custody ahead of a burn.
    fn transfer_in(&mut self, from: &Pubkey, amount: u128) -> Result<()>;

    /// Destroy `amount` held by the engine.
    fn burn(&mut self, amount: u128) -> Result<()>;
}

/// Everything an operation may call out to, plus the clock it runs at.
pub struct Collaborators<'a> {
    pub oracle: &'a dyn PriceOracle,
    pub collateral: &'a mut dyn CollateralVault,
    pub stable: &'a mut dyn StableUnitGateway,
    /// Unix timestamp used for price staleness.
    pub now: i64,
}

/// Stand-in for a collaborator an instruction was not given accounts for.
#[derive(Clone, Copy, Debug, Default)]
pub struct Disconnected;

impl CollateralVault for Disconnected {
    fn transfer_in(&mut self, _asset: &Pubkey, _from: &Pubkey, _amount: u128) -> Result<()> {
        err!(DscError::TransferFailed)
    }

    fn transfer_out(&mut self, _asset: &Pubkey, _to: &Pubkey, _amount: u128) -> Result<()> {
        err!(DscError::TransferFailed)
    }
}

impl StableUnitGateway for Disconnected {
    fn mint(&mut self, _to: &Pubkey, _amount: u128) -> Result<()> {
        err!(DscError::MintFailed)
    }

    fn transfer_in(&mut self, _from: &Pubkey, _amount: u128) -> Result<()> {
        err!(DscError::TransferFailed)
    }

    fn burn(&mut self, _amount: u128) -> Result<()> {
        err!(DscError::TransferFailed)
    }
}
