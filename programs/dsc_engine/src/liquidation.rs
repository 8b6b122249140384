use anchor_lang::prelude::*;

use crate::constants::{LIQUIDATION_BONUS, LIQUIDATION_PRECISION};
use crate::engine::DscEngine;
use crate::error::DscError;
use crate::events::Liquidated;
use crate::health::{calculate_health_factor, collateral_shortfall, is_healthy};
use crate::interfaces::Collaborators;
use crate::valuation::ValuationEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiquidationStage {
    Validate,
    ComputeSeizure,
    TransferCollateral,
    BurnDebt,
    Revalidate,
    Commit,
}

/// Collateral owed to a liquidator for covering a slice of debt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeizurePlan {
    pub base: u128,
    pub bonus: u128,
    pub total: u128,
}

impl SeizurePlan {
    pub fn for_debt(
        valuation: &ValuationEngine,
        asset: &Pubkey,
        debt_to_cover: u128,
    ) -> Result<Self> {
        let base = valuation.token_amount_for_usd(asset, debt_to_cover)?;
        let bonus = base
            .checked_mul(LIQUIDATION_BONUS)
            .ok_or(DscError::MathOverflow)?
            / LIQUIDATION_PRECISION;
        let total = base.checked_add(bonus).ok_or(DscError::MathOverflow)?;
        Ok(Self { base, bonus, total })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidationReceipt {
    pub debt_covered: u128,
    /// Total collateral sent to the liquidator, bonus included.
    pub collateral_seized: u128,
    pub bonus_collateral: u128,
    pub starting_health_factor: u128,
    pub ending_health_factor: u128,
}

impl DscEngine {
    /// Repay `debt_to_cover` of `user`'s debt with the liquidator's stable
    /// units and pay the liquidator in `asset` plus a 10% bonus.
    ///
    /// Only undercollateralized positions qualify. The bonus must be funded
    /// from the single `asset` named; other collateral is never touched.
    /// The liquidation fails if it leaves `user` with a larger unbacked debt
    /// than before, or if the liquidator's own position ends up unhealthy.
    pub fn liquidate(
        &mut self,
        liquidator: Pubkey,
        user: Pubkey,
        asset: Pubkey,
        debt_to_cover: u128,
        ext: &mut Collaborators,
    ) -> Result<LiquidationReceipt> {
        self.transact(|engine| {
            engine.apply_liquidation(liquidator, user, asset, debt_to_cover, ext)
        })
    }

    fn apply_liquidation(
        &mut self,
        liquidator: Pubkey,
        user: Pubkey,
        asset: Pubkey,
        debt_to_cover: u128,
        ext: &mut Collaborators,
    ) -> Result<LiquidationReceipt> {
        log_stage(LiquidationStage::Validate, &user);
        require!(debt_to_cover > 0, DscError::NeedsMoreThanZero);
        self.registry.require_allowed(&asset)?;

        let starting_debt = self.debt.debt_of(&user);
        let starting_collateral = self.account_collateral_value(&user, ext.oracle, ext.now)?;
        let starting_health_factor = calculate_health_factor(starting_debt, starting_collateral);
        if is_healthy(starting_health_factor) {
            msg!("Health factor {} is ok, nothing to liquidate", starting_health_factor);
            return err!(DscError::HealthFactorOk);
        }
        require!(
            debt_to_cover <= starting_debt,
            DscError::DebtToCoverExceedsDebt
        );

        log_stage(LiquidationStage::ComputeSeizure, &user);
        let valuation = self.valuation(ext.oracle, ext.now);
        let plan = SeizurePlan::for_debt(&valuation, &asset, debt_to_cover)?;
        let available = self.collateral.balance_of(&user, &asset);
        if plan.total > available {
            msg!(
                "Seizure of {} (bonus {}) exceeds {} held in {}",
                plan.total,
                plan.bonus,
                available,
                asset
            );
            return err!(DscError::InsufficientCollateralForLiquidation);
        }

        log_stage(LiquidationStage::TransferCollateral, &user);
        self.apply_redeem(asset, plan.total, user, liquidator, ext)?;

        log_stage(LiquidationStage::BurnDebt, &user);
        self.apply_burn(debt_to_cover, user, liquidator, ext)?;

        log_stage(LiquidationStage::Revalidate, &user);
        let ending_debt = self.debt.debt_of(&user);
        let ending_collateral = self.account_collateral_value(&user, ext.oracle, ext.now)?;
        let ending_health_factor = calculate_health_factor(ending_debt, ending_collateral);
        let shortfall_before = collateral_shortfall(starting_debt, starting_collateral);
        let shortfall_after = collateral_shortfall(ending_debt, ending_collateral);
        if shortfall_after > shortfall_before {
            msg!(
                "Unbacked debt grew from {} to {}",
                shortfall_before,
                shortfall_after
            );
            return err!(DscError::HealthFactorNotImproved);
        }
        self.revert_if_health_factor_is_broken(&liquidator, ext.oracle, ext.now)?;

        log_stage(LiquidationStage::Commit, &user);
        msg!(
            "✅ Liquidated {}: covered {}, seized {}, health factor {} -> {}",
            user,
            debt_to_cover,
            plan.total,
            starting_health_factor,
            ending_health_factor
        );
        emit!(Liquidated {
            liquidator,
            user,
            asset,
            debt_covered: debt_to_cover,
            collateral_seized: plan.total,
            bonus_collateral: plan.bonus,
            starting_health_factor,
            ending_health_factor,
            timestamp: ext.now,
        });

        Ok(LiquidationReceipt {
            debt_covered: debt_to_cover,
            collateral_seized: plan.total,
            bonus_collateral: plan.bonus,
            starting_health_factor,
            ending_health_factor,
        })
    }
}

fn log_stage(stage: LiquidationStage, user: &Pubkey) {
    msg!("Liquidation of {}: {:?}", user, stage);
}
