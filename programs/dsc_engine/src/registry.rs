use anchor_lang::prelude::*;

use crate::constants::{MAX_COLLATERAL_ASSETS, STABLE_DECIMALS};
use crate::error::DscError;
use crate::math::pow10;

/// One registered collateral asset.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollateralAsset {
    pub mint: Pubkey,
    pub price_feed: Pubkey,
    /// Native decimals of `mint`; ledger balances are kept at this precision.
    pub decimals: u8,
}

impl CollateralAsset {
    pub const LEN: usize = 32 + 32 + 1;

    /// `10^decimals`, the value of one whole token in ledger units.
    pub fn precision(&self) -> Result<u128> {
        pow10(self.decimals)
    }
}

/// Supported collateral assets in registration order.
///
/// Built once and never mutated afterwards. Iteration order is registration
/// order, which keeps account valuation deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    assets: Vec<CollateralAsset>,
}

impl TokenRegistry {
    /// Register `assets` with their `price_feeds`, assuming 18-decimal tokens.
    pub fn new(assets: &[Pubkey], price_feeds: &[Pubkey]) -> Result<Self> {
        let decimals = vec![STABLE_DECIMALS; assets.len()];
        Self::with_decimals(assets, price_feeds, &decimals)
    }

    pub fn with_decimals(
        assets: &[Pubkey],
        price_feeds: &[Pubkey],
        decimals: &[u8],
    ) -> Result<Self> {
        require!(
            assets.len() == price_feeds.len() && assets.len() == decimals.len(),
            DscError::TokenAddressesAndPriceFeedAddressesMustBeSameLength
        );

        let entries = assets
            .iter()
            .zip(price_feeds)
            .zip(decimals)
            .map(|((mint, price_feed), decimals)| CollateralAsset {
                mint: *mint,
                price_feed: *price_feed,
                decimals: *decimals,
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Rebuild a registry from stored entries, re-checking every constraint.
    pub fn from_entries(entries: Vec<CollateralAsset>) -> Result<Self> {
        require!(
            entries.len() <= MAX_COLLATERAL_ASSETS,
            DscError::TooManyCollateralAssets
        );
        for (index, entry) in entries.iter().enumerate() {
            require!(
                entry.decimals <= STABLE_DECIMALS,
                DscError::UnsupportedDecimals
            );
            require!(
                entries[..index].iter().all(|earlier| earlier.mint != entry.mint),
                DscError::DuplicateCollateralAsset
            );
        }
        Ok(Self { assets: entries })
    }

    pub fn get(&self, asset: &Pubkey) -> Option<&CollateralAsset> {
        self.assets.iter().find(|entry| entry.mint == *asset)
    }

    pub fn require_allowed(&self, asset: &Pubkey) -> Result<&CollateralAsset> {
        self.get(asset)
            .ok_or_else(|| error!(DscError::NotAllowedToken))
    }

    pub fn price_feed(&self, asset: &Pubkey) -> Option<Pubkey> {
        self.get(asset).map(|entry| entry.price_feed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollateralAsset> {
        self.assets.iter()
    }

    pub fn entries(&self) -> &[CollateralAsset] {
        &self.assets
    }

    pub fn collateral_tokens(&self) -> Vec<Pubkey> {
        self.assets.iter().map(|entry| entry.mint).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
