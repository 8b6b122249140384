use anchor_lang::prelude::*;

declare_id!("PriceFeed1111111111111111111111111111111111");

/// Implied decimals of every price pushed to a feed.
pub const FEED_DECIMALS: u8 = 8;

#[program]
pub mod price_feed {
    use super::*;

    /// Create the feed account for one collateral asset.
    pub fn initialize_feed(ctx: Context<InitializeFeed>, asset: Pubkey) -> Result<()> {
        let feed = &mut ctx.accounts.feed;
        feed.authority = ctx.accounts.authority.key();
        feed.asset = asset;
        feed.price = 0;
        feed.decimals = FEED_DECIMALS;
        feed.updated_at = 0;
        feed.round_id = 0;
        feed.bump = ctx.bumps.feed;
        msg!("✅ Price feed initialized for asset {}", asset);

        let clock = Clock::get()?;
        emit!(FeedInitialized {
            asset,
            authority: feed.authority,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }

    pub fn update_price(ctx: Context<UpdatePrice>, price: i64) -> Result<()> {
        let feed = &mut ctx.accounts.feed;
        require_keys_eq!(
            feed.authority,
            ctx.accounts.authority.key(),
            PriceFeedError::Unauthorized
        );
        require!(price > 0, PriceFeedError::InvalidPrice);

        let max_price = i64::MAX.checked_div(10_000).ok_or(PriceFeedError::MathOverflow)?;
        require!(price < max_price, PriceFeedError::PriceOutOfBounds);

        let clock = Clock::get()?;
        feed.price = price;
        feed.updated_at = clock.unix_timestamp;
        feed.round_id = feed.round_id.checked_add(1).ok_or(PriceFeedError::MathOverflow)?;
        msg!("Price for {} set to {} (round {})", feed.asset, price, feed.round_id);

        emit!(PriceUpdated {
            asset: feed.asset,
            price,
            round_id: feed.round_id,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }
}

#[derive(Accounts)]
#[instruction(asset: Pubkey)]
pub struct InitializeFeed<'info> {
    #[account(
        init,
        payer = authority,
        space = 8 + PriceFeed::LEN,
        seeds = [b"feed", asset.as_ref()],
        bump
    )]
    pub feed: Account<'info, PriceFeed>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdatePrice<'info> {
    #[account(
        mut,
        seeds = [b"feed", feed.asset.as_ref()],
        bump = feed.bump
    )]
    pub feed: Account<'info, PriceFeed>,
    pub authority: Signer<'info>,
}

#[account]
pub struct PriceFeed {
    pub authority: Pubkey,
    pub asset: Pubkey,
    pub price: i64,
    pub decimals: u8,
    pub updated_at: i64,
    pub round_id: u64,
    pub bump: u8,
}

impl PriceFeed {
    pub const LEN: usize = 32 + 32 + 8 + 1 + 8 + 8 + 1;

    /// Derive the feed address of `asset`.
    pub fn address(asset: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[b"feed", asset.as_ref()], &crate::ID)
    }
}

#[event]
pub struct FeedInitialized {
    pub asset: Pubkey,
    pub authority: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct PriceUpdated {
    pub asset: Pubkey,
    pub price: i64,
    pub round_id: u64,
    pub timestamp: i64,
}

#[error_code]
pub enum PriceFeedError {
    #[msg("Unauthorized price update")]
    Unauthorized,
    #[msg("Invalid price value")]
    InvalidPrice,
    #[msg("Price out of bounds")]
    PriceOutOfBounds,
    #[msg("Math overflow in price feed")]
    MathOverflow,
}
