use anchor_lang::prelude::*;

use crate::constants::STABLE_DECIMALS;
use crate::error::DscError;
use crate::ledger::CollateralLedger;
use crate::math::{mul_div, pow10};
use crate::registry::{CollateralAsset, TokenRegistry};

/// Latest round reported by a price feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceQuote {
    /// USD price with `decimals` implied decimals.
    pub price: i64,
    pub decimals: u8,
    /// Unix timestamp of the round.
    pub updated_at: i64,
}

/// Source of USD prices, keyed by price-feed identifier.
pub trait PriceOracle {
    fn latest_round(&self, price_feed: &Pubkey) -> Result<PriceQuote>;
}

/// Refuse quotes older than `max_age` seconds or stamped in the future.
pub fn stale_check(quote: &PriceQuote, now: i64, max_age: i64) -> Result<()> {
    let age = now
        .checked_sub(quote.updated_at)
        .ok_or(DscError::StalePrice)?;
    if age < 0 || age > max_age {
        msg!(
            "Stale price: updated at {}, now {}, max age {}s",
            quote.updated_at,
            now,
            max_age
        );
        return err!(DscError::StalePrice);
    }
    Ok(())
}

/// Converts between token quantities and 18-decimal USD values.
///
/// The oracle is queried on every conversion; nothing is cached.
pub struct ValuationEngine<'a> {
    registry: &'a TokenRegistry,
    oracle: &'a dyn PriceOracle,
    now: i64,
    max_price_age: i64,
}

impl<'a> ValuationEngine<'a> {
    pub fn new(
        registry: &'a TokenRegistry,
        oracle: &'a dyn PriceOracle,
        now: i64,
        max_price_age: i64,
    ) -> Self {
        Self {
            registry,
            oracle,
            now,
            max_price_age,
        }
    }

    /// Current price of `asset` lifted to 18 decimals.
    pub fn normalized_price(&self, asset: &CollateralAsset) -> Result<u128> {
        let quote = self.oracle.latest_round(&asset.price_feed)?;
        stale_check(&quote, self.now, self.max_price_age)?;
        require!(quote.price > 0, DscError::InvalidPrice);
        require!(quote.decimals <= STABLE_DECIMALS, DscError::InvalidPrice);

        let scale = pow10(STABLE_DECIMALS - quote.decimals)?;
        u128::try_from(quote.price)
            .map_err(|_| error!(DscError::InvalidPrice))?
            .checked_mul(scale)
            .ok_or_else(|| error!(DscError::MathOverflow))
    }

    /// USD value (18 decimals) of `amount` native units of `asset`.
    pub fn usd_value(&self, asset: &Pubkey, amount: u128) -> Result<u128> {
        let entry = self.registry.require_allowed(asset)?;
        let price = self.normalized_price(entry)?;
        mul_div(amount, price, entry.precision()?)
    }

    /// Native units of `asset` worth `usd_amount` (18 decimals), rounded down.
    pub fn token_amount_for_usd(&self, asset: &Pubkey, usd_amount: u128) -> Result<u128> {
        let entry = self.registry.require_allowed(asset)?;
        let price = self.normalized_price(entry)?;
        mul_div(usd_amount, entry.precision()?, price)
    }

    /// USD value of everything `user` has deposited, summed in registry order.
    pub fn account_collateral_value(
        &self,
        ledger: &CollateralLedger,
        user: &Pubkey,
    ) -> Result<u128> {
        let mut total = 0u128;
        for entry in self.registry.iter() {
            let amount = ledger.balance_of(user, &entry.mint);
            if amount == 0 {
                continue;
            }
            let value = self.usd_value(&entry.mint, amount)?;
            total = total.checked_add(value).ok_or(DscError::MathOverflow)?;
        }
        Ok(total)
    }

    /// USD value of every deposit in the ledger.
    pub fn total_collateral_value(&self, ledger: &CollateralLedger) -> Result<u128> {
        let mut total = 0u128;
        for entry in self.registry.iter() {
            let amount = ledger.total_deposited(&entry.mint)?;
            if amount == 0 {
                continue;
            }
            let value = self.usd_value(&entry.mint, amount)?;
            total = total.checked_add(value).ok_or(DscError::MathOverflow)?;
        }
        Ok(total)
    }
}
