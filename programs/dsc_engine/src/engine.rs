use anchor_lang::prelude::*;

use crate::constants::{
    ADDITIONAL_FEED_PRECISION, DEFAULT_MAX_PRICE_AGE, LIQUIDATION_BONUS, LIQUIDATION_PRECISION,
    LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR, PRECISION,
};
use crate::error::DscError;
use crate::events::{CollateralDeposited, CollateralRedeemed, StableBurned, StableMinted};
use crate::guard::ReentrancyGuard;
use crate::health;
use crate::interfaces::Collaborators;
use crate::ledger::{CollateralLedger, DebtLedger};
use crate::registry::TokenRegistry;
use crate::valuation::{PriceOracle, ValuationEngine};

/// Construction parameters besides the collateral registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineParams {
    /// Mint of the stable unit the engine issues.
    pub stable_mint: Pubkey,
    /// Oldest acceptable price, in seconds.
    pub max_price_age: i64,
}

impl EngineParams {
    pub fn new(stable_mint: Pubkey) -> Self {
        Self {
            stable_mint,
            max_price_age: DEFAULT_MAX_PRICE_AGE,
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountInformation {
    pub total_dsc_minted: u128,
    pub collateral_value_in_usd: u128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConstants {
    pub liquidation_threshold: u128,
    pub liquidation_bonus: u128,
    pub liquidation_precision: u128,
    pub precision: u128,
    pub additional_feed_precision: u128,
    pub min_health_factor: u128,
    pub max_price_age: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemTotals {
    pub total_dsc_minted: u128,
    pub collateral_value_in_usd: u128,
}

/// Position accounting for every user, plus the rules that keep it solvent.
///
/// Every state-changing operation runs through [`DscEngine::transact`]: it
/// holds the reentrancy guard for the whole call and restores both ledgers
/// if the operation fails part-way.
#[derive(Debug)]
pub struct DscEngine {
    pub(crate) registry: TokenRegistry,
    pub(crate) params: EngineParams,
    pub(crate) collateral: CollateralLedger,
    pub(crate) debt: DebtLedger,
    guard: ReentrancyGuard,
}

impl DscEngine {
    /// Build an engine over 18-decimal collateral assets.
    pub fn new(assets: &[Pubkey], price_feeds: &[Pubkey], stable_mint: Pubkey) -> Result<Self> {
        let registry = TokenRegistry::new(assets, price_feeds)?;
        Ok(Self::with_registry(registry, EngineParams::new(stable_mint)))
    }

    pub fn with_registry(registry: TokenRegistry, params: EngineParams) -> Self {
        Self {
            registry,
            params,
            collateral: CollateralLedger::default(),
            debt: DebtLedger::default(),
            guard: ReentrancyGuard::new(),
        }
    }

    /// Handle on the engine's reentrancy flag, for collaborators that call back in.
    pub fn guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn collateral_ledger(&self) -> &CollateralLedger {
        &self.collateral
    }

    pub fn debt_ledger(&self) -> &DebtLedger {
        &self.debt
    }

    /// Seed `user`'s position from persisted state. `collateral` follows registry order.
    pub fn load_position(
        &mut self,
        user: Pubkey,
        dsc_minted: u128,
        collateral: &[u128],
    ) -> Result<()> {
        require!(
            collateral.len() == self.registry.len(),
            DscError::LedgerMismatch
        );
        require!(
            self.debt.debt_of(&user) == 0 && self.collateral.positions_of(&user).next().is_none(),
            DscError::LedgerMismatch
        );
        for (entry, amount) in self.registry.iter().zip(collateral) {
            if *amount > 0 {
                self.collateral.credit(user, entry.mint, *amount)?;
            }
        }
        if dsc_minted > 0 {
            self.debt.increase(user, dsc_minted)?;
        }
        Ok(())
    }

    /// `user`'s debt and collateral balances in registry order.
    pub fn export_position(&self, user: &Pubkey) -> (u128, Vec<u128>) {
        let collateral = self
            .registry
            .iter()
            .map(|entry| self.collateral.balance_of(user, &entry.mint))
            .collect();
        (self.debt.debt_of(user), collateral)
    }

    /// Run `operation` atomically under the reentrancy guard.
    pub fn transact<T>(&mut self, operation: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let guard = self.guard.clone();
        let _entered = guard.enter()?;

        let collateral = self.collateral.clone();
        let debt = self.debt.clone();
        match operation(self) {
            Ok(value) => Ok(value),
            Err(error) => {
                msg!("Operation failed, ledgers restored: {}", error);
                self.collateral = collateral;
                self.debt = debt;
                Err(error)
            }
        }
    }

    // ========== USER OPERATIONS ==========

    pub fn deposit_collateral(
        &mut self,
        user: Pubkey,
        asset: Pubkey,
        amount_collateral: u128,
        ext: &mut Collaborators,
    ) -> Result<()> {
        self.transact(|engine| engine.apply_deposit(user, asset, amount_collateral, ext))
    }

    pub fn deposit_collateral_and_mint_dsc(
        &mut self,
        user: Pubkey,
        asset: Pubkey,
        amount_collateral: u128,
        amount_dsc_to_mint: u128,
        ext: &mut Collaborators,
    ) -> Result<()> {
        self.transact(|engine| {
            engine.apply_deposit(user, asset, amount_collateral, ext)?;
            engine.apply_mint(user, amount_dsc_to_mint, ext)
        })
    }

    /// Withdraw collateral; the position must stay healthy afterwards.
    pub fn redeem_collateral(
        &mut self,
        user: Pubkey,
        asset: Pubkey,
        amount_collateral: u128,
        ext: &mut Collaborators,
    ) -> Result<()> {
        self.transact(|engine| {
            engine.apply_redeem(asset, amount_collateral, user, user, ext)?;
            engine.revert_if_health_factor_is_broken(&user, ext.oracle, ext.now)
        })
    }

    /// Burn `amount_dsc_to_burn`, then withdraw collateral, then check health once.
    pub fn redeem_collateral_for_dsc(
        &mut self,
        user: Pubkey,
        asset: Pubkey,
        amount_collateral: u128,
        amount_dsc_to_burn: u128,
        ext: &mut Collaborators,
    ) -> Result<()> {
        self.transact(|engine| {
            engine.apply_burn(amount_dsc_to_burn, user, user, ext)?;
            engine.apply_redeem(asset, amount_collateral, user, user, ext)?;
            engine.revert_if_health_factor_is_broken(&user, ext.oracle, ext.now)
        })
    }

    pub fn mint_dsc(
        &mut self,
        user: Pubkey,
        amount_dsc_to_mint: u128,
        ext: &mut Collaborators,
    ) -> Result<()> {
        self.transact(|engine| engine.apply_mint(user, amount_dsc_to_mint, ext))
    }

    pub fn burn_dsc(&mut self, user: Pubkey, amount: u128, ext: &mut Collaborators) -> Result<()> {
        self.transact(|engine| {
            engine.apply_burn(amount, user, user, ext)?;
            engine.revert_if_health_factor_is_broken(&user, ext.oracle, ext.now)
        })
    }

    // ========== LEDGER STEPS ==========

    fn apply_deposit(
        &mut self,
        user: Pubkey,
        asset: Pubkey,
        amount: u128,
        ext: &mut Collaborators,
    ) -> Result<()> {
        require!(amount > 0, DscError::NeedsMoreThanZero);
        self.registry.require_allowed(&asset)?;

        let balance = self.collateral.credit(user, asset, amount)?;
        msg!("Deposited {} of {} for {} (balance {})", amount, asset, user, balance);
        emit!(CollateralDeposited {
            user,
            asset,
            amount,
        });

        external(
            ext.collateral.transfer_in(&asset, &user, amount),
            DscError::TransferFailed,
        )
    }

    pub(crate) fn apply_redeem(
        &mut self,
        asset: Pubkey,
        amount: u128,
        from: Pubkey,
        to: Pubkey,
        ext: &mut Collaborators,
    ) -> Result<()> {
        require!(amount > 0, DscError::NeedsMoreThanZero);
        self.registry.require_allowed(&asset)?;

        let balance = self.collateral.debit(from, asset, amount)?;
        msg!("Redeemed {} of {} from {} to {} (balance {})", amount, asset, from, to, balance);
        emit!(CollateralRedeemed {
            redeemed_from: from,
            redeemed_to: to,
            asset,
            amount,
        });

        external(
            ext.collateral.transfer_out(&asset, &to, amount),
            DscError::TransferFailed,
        )
    }

    fn apply_mint(&mut self, user: Pubkey, amount: u128, ext: &mut Collaborators) -> Result<()> {
        require!(amount > 0, DscError::NeedsMoreThanZero);

        let total_dsc_minted = self.debt.increase(user, amount)?;
        self.revert_if_health_factor_is_broken(&user, ext.oracle, ext.now)?;

        external(ext.stable.mint(&user, amount), DscError::MintFailed)?;
        msg!("Minted {} stable units to {} (debt {})", amount, user, total_dsc_minted);
        emit!(StableMinted {
            user,
            amount,
            total_dsc_minted,
        });
        Ok(())
    }

    /// Reduce `on_behalf_of`'s debt by `amount`, paid with `dsc_from`'s stable units.
    pub(crate) fn apply_burn(
        &mut self,
        amount: u128,
        on_behalf_of: Pubkey,
        dsc_from: Pubkey,
        ext: &mut Collaborators,
    ) -> Result<()> {
        require!(amount > 0, DscError::NeedsMoreThanZero);

        let total_dsc_minted = self.debt.decrease(on_behalf_of, amount)?;
        external(
            ext.stable.transfer_in(&dsc_from, amount),
            DscError::TransferFailed,
        )?;
        external(ext.stable.burn(amount), DscError::TransferFailed)?;

        msg!(
            "Burned {} stable units from {} for {} (debt {})",
            amount,
            dsc_from,
            on_behalf_of,
            total_dsc_minted
        );
        emit!(StableBurned {
            on_behalf_of,
            payer: dsc_from,
            amount,
            total_dsc_minted,
        });
        Ok(())
    }

    pub(crate) fn revert_if_health_factor_is_broken(
        &self,
        user: &Pubkey,
        oracle: &dyn PriceOracle,
        now: i64,
    ) -> Result<()> {
        let health_factor = self.health_factor(user, oracle, now)?;
        if !health::is_healthy(health_factor) {
            msg!("Health factor of {} broken: {}", user, health_factor);
            return err!(DscError::BreaksHealthFactor);
        }
        Ok(())
    }

    // ========== QUERIES ==========

    pub(crate) fn valuation<'a>(
        &'a self,
        oracle: &'a dyn PriceOracle,
        now: i64,
    ) -> ValuationEngine<'a> {
        ValuationEngine::new(&self.registry, oracle, now, self.params.max_price_age)
    }

    pub fn account_information(
        &self,
        user: &Pubkey,
        oracle: &dyn PriceOracle,
        now: i64,
    ) -> Result<AccountInformation> {
        Ok(AccountInformation {
            total_dsc_minted: self.debt.debt_of(user),
            collateral_value_in_usd: self.account_collateral_value(user, oracle, now)?,
        })
    }

    /// `user`'s current health factor. A debt-free user is never priced.
    pub fn health_factor(&self, user: &Pubkey, oracle: &dyn PriceOracle, now: i64) -> Result<u128> {
        let total_dsc_minted = self.debt.debt_of(user);
        if total_dsc_minted == 0 {
            return Ok(u128::MAX);
        }
        let collateral_value_in_usd = self.account_collateral_value(user, oracle, now)?;
        Ok(health::calculate_health_factor(
            total_dsc_minted,
            collateral_value_in_usd,
        ))
    }

    pub fn calculate_health_factor(
        &self,
        total_dsc_minted: u128,
        collateral_value_in_usd: u128,
    ) -> u128 {
        health::calculate_health_factor(total_dsc_minted, collateral_value_in_usd)
    }

    pub fn collateral_balance_of(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        self.collateral.balance_of(user, asset)
    }

    pub fn usd_value(
        &self,
        asset: &Pubkey,
        amount: u128,
        oracle: &dyn PriceOracle,
        now: i64,
    ) -> Result<u128> {
        self.valuation(oracle, now).usd_value(asset, amount)
    }

    pub fn token_amount_from_usd(
        &self,
        asset: &Pubkey,
        usd_amount: u128,
        oracle: &dyn PriceOracle,
        now: i64,
    ) -> Result<u128> {
        self.valuation(oracle, now).token_amount_for_usd(asset, usd_amount)
    }

    pub fn account_collateral_value(
        &self,
        user: &Pubkey,
        oracle: &dyn PriceOracle,
        now: i64,
    ) -> Result<u128> {
        self.valuation(oracle, now)
            .account_collateral_value(&self.collateral, user)
    }

    pub fn collateral_tokens(&self) -> Vec<Pubkey> {
        self.registry.collateral_tokens()
    }

    pub fn collateral_token_price_feed(&self, asset: &Pubkey) -> Option<Pubkey> {
        self.registry.price_feed(asset)
    }

    pub fn dsc_minted(&self, user: &Pubkey) -> u128 {
        self.debt.debt_of(user)
    }

    pub fn stable_mint(&self) -> Pubkey {
        self.params.stable_mint
    }

    pub fn constants(&self) -> EngineConstants {
        EngineConstants {
            liquidation_threshold: LIQUIDATION_THRESHOLD,
            liquidation_bonus: LIQUIDATION_BONUS,
            liquidation_precision: LIQUIDATION_PRECISION,
            precision: PRECISION,
            additional_feed_precision: ADDITIONAL_FEED_PRECISION,
            min_health_factor: MIN_HEALTH_FACTOR,
            max_price_age: self.params.max_price_age,
        }
    }

    /// Outstanding stable units against the USD value of all deposits.
    pub fn system_totals(&self, oracle: &dyn PriceOracle, now: i64) -> Result<SystemTotals> {
        Ok(SystemTotals {
            total_dsc_minted: self.debt.total_minted()?,
            collateral_value_in_usd: self
                .valuation(oracle, now)
                .total_collateral_value(&self.collateral)?,
        })
    }
}

/// Map a collaborator failure onto `failure`, keeping reentrancy visible.
fn external(result: Result<()>, failure: DscError) -> Result<()> {
    result.map_err(|error| {
        if error == DscError::Reentrancy.into() {
            return error;
        }
        msg!("External call failed: {}", error);
        error!(failure)
    })
}
