use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{self, Mint, Token, TokenAccount};

pub mod adapters;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod guard;
pub mod health;
pub mod interfaces;
pub mod ledger;
pub mod liquidation;
pub mod math;
pub mod registry;
pub mod state;
pub mod valuation;

pub use adapters::{FeedAccounts, SplCollateralVault, SplStableGateway};
pub use constants::*;
pub use engine::{AccountInformation, DscEngine, EngineConstants, EngineParams, SystemTotals};
pub use error::DscError;
pub use events::*;
pub use guard::{Entered, ReentrancyGuard};
pub use interfaces::{CollateralVault, Collaborators, Disconnected, StableUnitGateway};
pub use ledger::{CollateralLedger, DebtLedger};
pub use liquidation::{LiquidationReceipt, LiquidationStage, SeizurePlan};
pub use registry::{CollateralAsset, TokenRegistry};
pub use state::{EngineConfig, UserLedger};
pub use valuation::{PriceOracle, PriceQuote, ValuationEngine};

declare_id!("DscEngine1111111111111111111111111111111111");

#[program]
pub mod dsc_engine {
    use super::*;

    /// Register collateral and bind the stable mint.
    ///
    /// `remaining_accounts` carries the collateral mint accounts in the same
    /// order as `collateral_mints`; their decimals are recorded. Only feeds
    /// pushed by `feed_authority` are read afterwards.
    pub fn initialize_engine(
        ctx: Context<InitializeEngine>,
        collateral_mints: Vec<Pubkey>,
        price_feeds: Vec<Pubkey>,
        max_price_age: i64,
        feed_authority: Pubkey,
    ) -> Result<()> {
        require!(
            collateral_mints.len() == price_feeds.len(),
            DscError::TokenAddressesAndPriceFeedAddressesMustBeSameLength
        );
        require!(
            ctx.remaining_accounts.len() == collateral_mints.len(),
            DscError::CollateralMintMismatch
        );
        require!(max_price_age > 0, DscError::NeedsMoreThanZero);

        let mut decimals = Vec::with_capacity(collateral_mints.len());
        for (mint, info) in collateral_mints.iter().zip(ctx.remaining_accounts) {
            require_keys_eq!(*info.key, *mint, DscError::CollateralMintMismatch);
            require_keys_eq!(*info.owner, token::ID, DscError::CollateralMintMismatch);
            let data = info.try_borrow_data()?;
            decimals.push(Mint::try_deserialize(&mut &data[..])?.decimals);
        }
        let registry = TokenRegistry::with_decimals(&collateral_mints, &price_feeds, &decimals)?;

        let dsc_mint = &ctx.accounts.dsc_mint;
        require!(
            dsc_mint.decimals <= STABLE_DECIMALS,
            DscError::UnsupportedDecimals
        );

        let config = &mut ctx.accounts.config;
        config.stable_mint = dsc_mint.key();
        config.stable_decimals = dsc_mint.decimals;
        config.max_price_age = max_price_age;
        config.feed_authority = feed_authority;
        config.collateral_assets = registry.entries().to_vec();
        config.bump = ctx.bumps.config;
        config.vault_authority_bump = ctx.bumps.vault_authority;
        msg!(
            "✅ Engine initialized: {} collateral assets, stable mint {}",
            registry.len(),
            config.stable_mint
        );
        Ok(())
    }

    pub fn deposit_collateral(
        ctx: Context<ManageCollateral>,
        amount_collateral: u64,
    ) -> Result<()> {
        let user = ctx.accounts.user.key();
        let asset = ctx.accounts.collateral_mint.key();
        let mut engine = open_engine(
            &ctx.accounts.config,
            &mut ctx.accounts.ledger,
            user,
            ctx.bumps.ledger,
        )?;

        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let mut vault = ctx.accounts.collateral_vault();
        let mut stable = Disconnected;
        let mut ext = Collaborators {
            oracle: &oracle,
            collateral: &mut vault,
            stable: &mut stable,
            now: Clock::get()?.unix_timestamp,
        };
        engine.deposit_collateral(user, asset, u128::from(amount_collateral), &mut ext)?;

        ctx.accounts.ledger.store_from(&engine);
        Ok(())
    }

    /// Price feeds of every collateral the user holds go in `remaining_accounts`.
    pub fn redeem_collateral(ctx: Context<ManageCollateral>, amount_collateral: u64) -> Result<()> {
        let user = ctx.accounts.user.key();
        let asset = ctx.accounts.collateral_mint.key();
        let mut engine = open_engine(
            &ctx.accounts.config,
            &mut ctx.accounts.ledger,
            user,
            ctx.bumps.ledger,
        )?;

        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let mut vault = ctx.accounts.collateral_vault();
        let mut stable = Disconnected;
        let mut ext = Collaborators {
            oracle: &oracle,
            collateral: &mut vault,
            stable: &mut stable,
            now: Clock::get()?.unix_timestamp,
        };
        engine.redeem_collateral(user, asset, u128::from(amount_collateral), &mut ext)?;

        ctx.accounts.ledger.store_from(&engine);
        Ok(())
    }

    /// `amount_dsc_to_mint` is in stable mint units.
    pub fn mint_dsc(ctx: Context<ManageDebt>, amount_dsc_to_mint: u64) -> Result<()> {
        let user = ctx.accounts.user.key();
        let amount =
            math::from_mint_units(amount_dsc_to_mint, ctx.accounts.config.stable_scale()?)?;
        let mut engine = open_engine(
            &ctx.accounts.config,
            &mut ctx.accounts.ledger,
            user,
            ctx.bumps.ledger,
        )?;

        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let mut vault = Disconnected;
        let mut stable = ctx.accounts.stable_gateway()?;
        let mut ext = Collaborators {
            oracle: &oracle,
            collateral: &mut vault,
            stable: &mut stable,
            now: Clock::get()?.unix_timestamp,
        };
        engine.mint_dsc(user, amount, &mut ext)?;

        ctx.accounts.ledger.store_from(&engine);
        Ok(())
    }

    pub fn burn_dsc(ctx: Context<ManageDebt>, amount: u64) -> Result<()> {
        let user = ctx.accounts.user.key();
        let amount = math::from_mint_units(amount, ctx.accounts.config.stable_scale()?)?;
        let mut engine = open_engine(
            &ctx.accounts.config,
            &mut ctx.accounts.ledger,
            user,
            ctx.bumps.ledger,
        )?;

        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let mut vault = Disconnected;
        let mut stable = ctx.accounts.stable_gateway()?;
        let mut ext = Collaborators {
            oracle: &oracle,
            collateral: &mut vault,
            stable: &mut stable,
            now: Clock::get()?.unix_timestamp,
        };
        engine.burn_dsc(user, amount, &mut ext)?;

        ctx.accounts.ledger.store_from(&engine);
        Ok(())
    }

    pub fn deposit_collateral_and_mint_dsc(
        ctx: Context<ManagePosition>,
        amount_collateral: u64,
        amount_dsc_to_mint: u64,
    ) -> Result<()> {
        let user = ctx.accounts.user.key();
        let asset = ctx.accounts.collateral_mint.key();
        let amount_dsc =
            math::from_mint_units(amount_dsc_to_mint, ctx.accounts.config.stable_scale()?)?;
        let mut engine = open_engine(
            &ctx.accounts.config,
            &mut ctx.accounts.ledger,
            user,
            ctx.bumps.ledger,
        )?;

        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let mut vault = ctx.accounts.collateral_vault();
        let mut stable = ctx.accounts.stable_gateway()?;
        let mut ext = Collaborators {
            oracle: &oracle,
            collateral: &mut vault,
            stable: &mut stable,
            now: Clock::get()?.unix_timestamp,
        };
        engine.deposit_collateral_and_mint_dsc(
            user,
            asset,
            u128::from(amount_collateral),
            amount_dsc,
            &mut ext,
        )?;

        ctx.accounts.ledger.store_from(&engine);
        Ok(())
    }

    pub fn redeem_collateral_for_dsc(
        ctx: Context<ManagePosition>,
        amount_collateral: u64,
        amount_dsc_to_burn: u64,
    ) -> Result<()> {
        let user = ctx.accounts.user.key();
        let asset = ctx.accounts.collateral_mint.key();
        let amount_dsc =
            math::from_mint_units(amount_dsc_to_burn, ctx.accounts.config.stable_scale()?)?;
        let mut engine = open_engine(
            &ctx.accounts.config,
            &mut ctx.accounts.ledger,
            user,
            ctx.bumps.ledger,
        )?;

        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let mut vault = ctx.accounts.collateral_vault();
        let mut stable = ctx.accounts.stable_gateway()?;
        let mut ext = Collaborators {
            oracle: &oracle,
            collateral: &mut vault,
            stable: &mut stable,
            now: Clock::get()?.unix_timestamp,
        };
        engine.redeem_collateral_for_dsc(
            user,
            asset,
            u128::from(amount_collateral),
            amount_dsc,
            &mut ext,
        )?;

        ctx.accounts.ledger.store_from(&engine);
        Ok(())
    }

    /// Cover `debt_to_cover` stable mint units of the target's debt.
    pub fn liquidate(ctx: Context<Liquidate>, debt_to_cover: u64) -> Result<()> {
        let liquidator = ctx.accounts.liquidator.key();
        let user = ctx.accounts.target_ledger.owner;
        let asset = ctx.accounts.collateral_mint.key();
        let debt_to_cover =
            math::from_mint_units(debt_to_cover, ctx.accounts.config.stable_scale()?)?;

        let mut engine = ctx.accounts.config.engine()?;
        let asset_count = ctx.accounts.config.collateral_assets.len();
        let target_bump = ctx.accounts.target_ledger.bump;
        ctx.accounts
            .target_ledger
            .prepare(user, target_bump, asset_count)?;
        ctx.accounts.target_ledger.load_into(&mut engine)?;
        ctx.accounts
            .liquidator_ledger
            .prepare(liquidator, ctx.bumps.liquidator_ledger, asset_count)?;
        ctx.accounts.liquidator_ledger.load_into(&mut engine)?;

        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let mut vault = ctx.accounts.collateral_vault();
        let mut stable = ctx.accounts.stable_gateway()?;
        let mut ext = Collaborators {
            oracle: &oracle,
            collateral: &mut vault,
            stable: &mut stable,
            now: Clock::get()?.unix_timestamp,
        };
        engine.liquidate(liquidator, user, asset, debt_to_cover, &mut ext)?;

        ctx.accounts.target_ledger.store_from(&engine);
        ctx.accounts.liquidator_ledger.store_from(&engine);
        Ok(())
    }

    pub fn get_health_factor(ctx: Context<HealthView>) -> Result<u128> {
        let engine = open_view(&ctx.accounts.config, &ctx.accounts.ledger)?;
        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let owner = ctx.accounts.ledger.owner;
        let health_factor = engine.health_factor(&owner, &oracle, Clock::get()?.unix_timestamp)?;
        msg!("Health factor of {}: {}", owner, health_factor);
        Ok(health_factor)
    }

    pub fn get_account_information(ctx: Context<HealthView>) -> Result<AccountInformation> {
        let engine = open_view(&ctx.accounts.config, &ctx.accounts.ledger)?;
        let oracle = FeedAccounts::new(ctx.remaining_accounts, ctx.accounts.config.feed_authority);
        let owner = ctx.accounts.ledger.owner;
        engine.account_information(&owner, &oracle, Clock::get()?.unix_timestamp)
    }
}

fn open_engine(
    config: &EngineConfig,
    ledger: &mut UserLedger,
    owner: Pubkey,
    bump: u8,
) -> Result<DscEngine> {
    let mut engine = config.engine()?;
    ledger.prepare(owner, bump, config.collateral_assets.len())?;
    ledger.load_into(&mut engine)?;
    Ok(engine)
}

fn open_view(config: &EngineConfig, ledger: &UserLedger) -> Result<DscEngine> {
    let mut engine = config.engine()?;
    ledger.load_into(&mut engine)?;
    Ok(engine)
}

#[derive(Accounts)]
pub struct InitializeEngine<'info> {
    #[account(
        init,
        payer = payer,
        space = 8 + EngineConfig::LEN,
        seeds = [ENGINE_SEED],
        bump
    )]
    pub config: Account<'info, EngineConfig>,
    /// CHECK: PDA that owns the vaults and mints the stable unit; holds no data.
    #[account(seeds = [VAULT_AUTHORITY_SEED], bump)]
    pub vault_authority: UncheckedAccount<'info>,
    #[account(
        constraint = dsc_mint.mint_authority == COption::Some(vault_authority.key())
            @ DscError::StableMintAuthorityMismatch
    )]
    pub dsc_mint: Account<'info, Mint>,
    #[account(mut)]
    pub payer: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct ManageCollateral<'info> {
    #[account(seeds = [ENGINE_SEED], bump = config.bump)]
    pub config: Account<'info, EngineConfig>,
    #[account(
        init_if_needed,
        payer = user,
        space = 8 + UserLedger::LEN,
        seeds = [LEDGER_SEED, user.key().as_ref()],
        bump
    )]
    pub ledger: Account<'info, UserLedger>,
    #[account(mut)]
    pub user: Signer<'info>,
    /// CHECK: vault authority PDA, signs transfers out of the vault.
    #[account(seeds = [VAULT_AUTHORITY_SEED], bump = config.vault_authority_bump)]
    pub vault_authority: UncheckedAccount<'info>,
    pub collateral_mint: Account<'info, Mint>,
    #[account(
        mut,
        token::mint = collateral_mint,
        token::authority = user
    )]
    pub user_collateral_ata: Account<'info, TokenAccount>,
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = collateral_mint,
        associated_token::authority = vault_authority
    )]
    pub vault_collateral_ata: Account<'info, TokenAccount>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> ManageCollateral<'info> {
    fn collateral_vault(&self) -> SplCollateralVault<'info> {
        SplCollateralVault {
            token_program: self.token_program.to_account_info(),
            mint: self.collateral_mint.key(),
            counterparty: self.user.to_account_info(),
            counterparty_ata: self.user_collateral_ata.to_account_info(),
            vault_ata: self.vault_collateral_ata.to_account_info(),
            vault_authority: self.vault_authority.to_account_info(),
            vault_authority_bump: self.config.vault_authority_bump,
        }
    }
}

#[derive(Accounts)]
pub struct ManageDebt<'info> {
    #[account(seeds = [ENGINE_SEED], bump = config.bump)]
    pub config: Account<'info, EngineConfig>,
    #[account(
        init_if_needed,
        payer = user,
        space = 8 + UserLedger::LEN,
        seeds = [LEDGER_SEED, user.key().as_ref()],
        bump
    )]
    pub ledger: Account<'info, UserLedger>,
    #[account(mut)]
    pub user: Signer<'info>,
    /// CHECK: vault authority PDA, mint authority of the stable unit.
    #[account(seeds = [VAULT_AUTHORITY_SEED], bump = config.vault_authority_bump)]
    pub vault_authority: UncheckedAccount<'info>,
    #[account(mut, address = config.stable_mint)]
    pub dsc_mint: Account<'info, Mint>,
    #[account(
        mut,
        token::mint = dsc_mint,
        token::authority = user
    )]
    pub user_dsc_ata: Account<'info, TokenAccount>,
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = dsc_mint,
        associated_token::authority = vault_authority
    )]
    pub vault_dsc_ata: Account<'info, TokenAccount>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> ManageDebt<'info> {
    fn stable_gateway(&self) -> Result<SplStableGateway<'info>> {
        Ok(SplStableGateway {
            token_program: self.token_program.to_account_info(),
            mint: self.dsc_mint.to_account_info(),
            counterparty: self.user.to_account_info(),
            counterparty_ata: self.user_dsc_ata.to_account_info(),
            vault_ata: self.vault_dsc_ata.to_account_info(),
            vault_authority: self.vault_authority.to_account_info(),
            vault_authority_bump: self.config.vault_authority_bump,
            scale: self.config.stable_scale()?,
        })
    }
}

#[derive(Accounts)]
pub struct ManagePosition<'info> {
    #[account(seeds = [ENGINE_SEED], bump = config.bump)]
    pub config: Box<Account<'info, EngineConfig>>,
    #[account(
        init_if_needed,
        payer = user,
        space = 8 + UserLedger::LEN,
        seeds = [LEDGER_SEED, user.key().as_ref()],
        bump
    )]
    pub ledger: Box<Account<'info, UserLedger>>,
    #[account(mut)]
    pub user: Signer<'info>,
    /// CHECK: vault authority PDA.
    #[account(seeds = [VAULT_AUTHORITY_SEED], bump = config.vault_authority_bump)]
    pub vault_authority: UncheckedAccount<'info>,
    pub collateral_mint: Box<Account<'info, Mint>>,
    #[account(
        mut,
        token::mint = collateral_mint,
        token::authority = user
    )]
    pub user_collateral_ata: Box<Account<'info, TokenAccount>>,
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = collateral_mint,
        associated_token::authority = vault_authority
    )]
    pub vault_collateral_ata: Box<Account<'info, TokenAccount>>,
    #[account(mut, address = config.stable_mint)]
    pub dsc_mint: Box<Account<'info, Mint>>,
    #[account(
        mut,
        token::mint = dsc_mint,
        token::authority = user
    )]
    pub user_dsc_ata: Box<Account<'info, TokenAccount>>,
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = dsc_mint,
        associated_token::authority = vault_authority
    )]
    pub vault_dsc_ata: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> ManagePosition<'info> {
    fn collateral_vault(&self) -> SplCollateralVault<'info> {
        SplCollateralVault {
            token_program: self.token_program.to_account_info(),
            mint: self.collateral_mint.key(),
            counterparty: self.user.to_account_info(),
            counterparty_ata: self.user_collateral_ata.to_account_info(),
            vault_ata: self.vault_collateral_ata.to_account_info(),
            vault_authority: self.vault_authority.to_account_info(),
            vault_authority_bump: self.config.vault_authority_bump,
        }
    }

    fn stable_gateway(&self) -> Result<SplStableGateway<'info>> {
        Ok(SplStableGateway {
            token_program: self.token_program.to_account_info(),
            mint: self.dsc_mint.to_account_info(),
            counterparty: self.user.to_account_info(),
            counterparty_ata: self.user_dsc_ata.to_account_info(),
            vault_ata: self.vault_dsc_ata.to_account_info(),
            vault_authority: self.vault_authority.to_account_info(),
            vault_authority_bump: self.config.vault_authority_bump,
            scale: self.config.stable_scale()?,
        })
    }
}

#[derive(Accounts)]
pub struct Liquidate<'info> {
    #[account(seeds = [ENGINE_SEED], bump = config.bump)]
    pub config: Box<Account<'info, EngineConfig>>,
    #[account(
        mut,
        seeds = [LEDGER_SEED, target_ledger.owner.as_ref()],
        bump = target_ledger.bump,
        constraint = target_ledger.owner != liquidator.key() @ DscError::SelfLiquidation
    )]
    pub target_ledger: Box<Account<'info, UserLedger>>,
    #[account(
        init_if_needed,
        payer = liquidator,
        space = 8 + UserLedger::LEN,
        seeds = [LEDGER_SEED, liquidator.key().as_ref()],
        bump
    )]
    pub liquidator_ledger: Box<Account<'info, UserLedger>>,
    #[account(mut)]
    pub liquidator: Signer<'info>,
    /// CHECK: vault authority PDA.
    #[account(seeds = [VAULT_AUTHORITY_SEED], bump = config.vault_authority_bump)]
    pub vault_authority: UncheckedAccount<'info>,
    pub collateral_mint: Box<Account<'info, Mint>>,
    #[account(
        init_if_needed,
        payer = liquidator,
        associated_token::mint = collateral_mint,
        associated_token::authority = liquidator
    )]
    pub liquidator_collateral_ata: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        associated_token::mint = collateral_mint,
        associated_token::authority = vault_authority
    )]
    pub vault_collateral_ata: Box<Account<'info, TokenAccount>>,
    #[account(mut, address = config.stable_mint)]
    pub dsc_mint: Box<Account<'info, Mint>>,
    #[account(
        mut,
        token::mint = dsc_mint,
        token::authority = liquidator
    )]
    pub liquidator_dsc_ata: Box<Account<'info, TokenAccount>>,
    #[account(
        init_if_needed,
        payer = liquidator,
        associated_token::mint = dsc_mint,
        associated_token::authority = vault_authority
    )]
    pub vault_dsc_ata: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> Liquidate<'info> {
    fn collateral_vault(&self) -> SplCollateralVault<'info> {
        SplCollateralVault {
            token_program: self.token_program.to_account_info(),
            mint: self.collateral_mint.key(),
            counterparty: self.liquidator.to_account_info(),
            counterparty_ata: self.liquidator_collateral_ata.to_account_info(),
            vault_ata: self.vault_collateral_ata.to_account_info(),
            vault_authority: self.vault_authority.to_account_info(),
            vault_authority_bump: self.config.vault_authority_bump,
        }
    }

    fn stable_gateway(&self) -> Result<SplStableGateway<'info>> {
        Ok(SplStableGateway {
            token_program: self.token_program.to_account_info(),
            mint: self.dsc_mint.to_account_info(),
            counterparty: self.liquidator.to_account_info(),
            counterparty_ata: self.liquidator_dsc_ata.to_account_info(),
            vault_ata: self.vault_dsc_ata.to_account_info(),
            vault_authority: self.vault_authority.to_account_info(),
            vault_authority_bump: self.config.vault_authority_bump,
            scale: self.config.stable_scale()?,
        })
    }
}

#[derive(Accounts)]
pub struct HealthView<'info> {
    #[account(seeds = [ENGINE_SEED], bump = config.bump)]
    pub config: Account<'info, EngineConfig>,
    #[account(seeds = [LEDGER_SEED, ledger.owner.as_ref()], bump = ledger.bump)]
    pub ledger: Account<'info, UserLedger>,
}
