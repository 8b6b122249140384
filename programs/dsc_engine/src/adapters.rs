//! SPL-token and price-feed account implementations of the collaborator traits.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, MintTo, Transfer};
use price_feed::PriceFeed;

use crate::constants::VAULT_AUTHORITY_SEED;
use crate::error::DscError;
use crate::interfaces::{CollateralVault, StableUnitGateway};
use crate::math::{to_mint_units, to_u64};
use crate::valuation::{PriceOracle, PriceQuote};

/// Reads `price_feed` accounts passed as remaining accounts. A feed whose
/// authority is not `feed_authority` is treated as unknown.
pub struct FeedAccounts<'a, 'info> {
    accounts: &'a [AccountInfo<'info>],
    feed_authority: Pubkey,
}

impl<'a, 'info> FeedAccounts<'a, 'info> {
    pub fn new(accounts: &'a [AccountInfo<'info>], feed_authority: Pubkey) -> Self {
        Self {
            accounts,
            feed_authority,
        }
    }
}

impl PriceOracle for FeedAccounts<'_, '_> {
    fn latest_round(&self, feed_key: &Pubkey) -> Result<PriceQuote> {
        let info = self
            .accounts
            .iter()
            .find(|info| info.key == feed_key)
            .ok_or_else(|| error!(DscError::PriceFeedMismatch))?;
        require_keys_eq!(*info.owner, price_feed::ID, DscError::PriceFeedMismatch);

        let data = info.try_borrow_data()?;
        let feed = PriceFeed::try_deserialize(&mut &data[..])?;
        require_keys_eq!(feed.authority, self.feed_authority, DscError::PriceFeedMismatch);
        Ok(PriceQuote {
            price: feed.price,
            decimals: feed.decimals,
            updated_at: feed.updated_at,
        })
    }
}

/// Collateral custody for one mint: the counterparty's token account on one
/// side, the vault authority's token account on the other.
pub struct SplCollateralVault<'info> {
    pub token_program: AccountInfo<'info>,
    pub mint: Pubkey,
    pub counterparty: AccountInfo<'info>,
    pub counterparty_ata: AccountInfo<'info>,
    pub vault_ata: AccountInfo<'info>,
    pub vault_authority: AccountInfo<'info>,
    pub vault_authority_bump: u8,
}

impl CollateralVault for SplCollateralVault<'_> {
    fn transfer_in(&mut self, asset: &Pubkey, from: &Pubkey, amount: u128) -> Result<()> {
        require_keys_eq!(*asset, self.mint, DscError::CollateralMintMismatch);
        require_keys_eq!(*from, self.counterparty.key(), DscError::TransferFailed);

        token::transfer(
            CpiContext::new(
                self.token_program.clone(),
                Transfer {
                    from: self.counterparty_ata.clone(),
                    to: self.vault_ata.clone(),
                    authority: self.counterparty.clone(),
                },
            ),
            to_u64(amount)?,
        )
    }

    fn transfer_out(&mut self, asset: &Pubkey, to: &Pubkey, amount: u128) -> Result<()> {
        require_keys_eq!(*asset, self.mint, DscError::CollateralMintMismatch);
        require_keys_eq!(*to, self.counterparty.key(), DscError::TransferFailed);

        let bump = [self.vault_authority_bump];
        let seeds = &[VAULT_AUTHORITY_SEED, bump.as_ref()];
        let signer_seeds = &[&seeds[..]];

        token::transfer(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                Transfer {
                    from: self.vault_ata.clone(),
                    to: self.counterparty_ata.clone(),
                    authority: self.vault_authority.clone(),
                },
                signer_seeds,
            ),
            to_u64(amount)?,
        )
    }
}

/// Stable-unit mint whose authority is the vault authority PDA.
///
/// Ledger amounts carry 18 decimals; `scale` converts them to mint units and
/// refuses amounts the mint cannot represent exactly.
pub struct SplStableGateway<'info> {
    pub token_program: AccountInfo<'info>,
    pub mint: AccountInfo<'info>,
    pub counterparty: AccountInfo<'info>,
    pub counterparty_ata: AccountInfo<'info>,
    pub vault_ata: AccountInfo<'info>,
    pub vault_authority: AccountInfo<'info>,
    pub vault_authority_bump: u8,
    pub scale: u128,
}

impl StableUnitGateway for SplStableGateway<'_> {
    fn mint(&mut self, to: &Pubkey, amount: u128) -> Result<()> {
        require_keys_eq!(*to, self.counterparty.key(), DscError::MintFailed);

        let bump = [self.vault_authority_bump];
        let seeds = &[VAULT_AUTHORITY_SEED, bump.as_ref()];
        let signer_seeds = &[&seeds[..]];

        token::mint_to(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                MintTo {
                    mint: self.mint.clone(),
                    to: self.counterparty_ata.clone(),
                    authority: self.vault_authority.clone(),
                },
                signer_seeds,
            ),
            to_mint_units(amount, self.scale)?,
        )
    }

    fn transfer_in(&mut self, from: &Pubkey, amount: u128) -> Result<()> {
        require_keys_eq!(*from, self.counterparty.key(), DscError::TransferFailed);

        token::transfer(
            CpiContext::new(
                self.token_program.clone(),
                Transfer {
                    from: self.counterparty_ata.clone(),
                    to: self.vault_ata.clone(),
                    authority: self.counterparty.clone(),
                },
            ),
            to_mint_units(amount, self.scale)?,
        )
    }

    fn burn(&mut self, amount: u128) -> Result<()> {
        let bump = [self.vault_authority_bump];
        let seeds = &[VAULT_AUTHORITY_SEED, bump.as_ref()];
        let signer_seeds = &[&seeds[..]];

        token::burn(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                Burn {
                    mint: self.mint.clone(),
                    from: self.vault_ata.clone(),
                    authority: self.vault_authority.clone(),
                },
                signer_seeds,
            ),
            to_mint_units(amount, self.scale)?,
        )
    }
}
