use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::error::DscError;

/// Deposited collateral keyed by `(user, asset)`, at each asset's native precision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollateralLedger {
    positions: BTreeMap<(Pubkey, Pubkey), u128>,
}

impl CollateralLedger {
    pub fn balance_of(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        self.positions.get(&(*user, *asset)).copied().unwrap_or(0)
    }

    /// Add `amount` to the position and return the new balance.
    pub fn credit(&mut self, user: Pubkey, asset: Pubkey, amount: u128) -> Result<u128> {
        let balance = self
            .balance_of(&user, &asset)
            .checked_add(amount)
            .ok_or(DscError::MathOverflow)?;
        self.positions.insert((user, asset), balance);
        Ok(balance)
    }

    /// Remove `amount` from the position and return the new balance.
    pub fn debit(&mut self, user: Pubkey, asset: Pubkey, amount: u128) -> Result<u128> {
        let balance = self
            .balance_of(&user, &asset)
            .checked_sub(amount)
            .ok_or(DscError::InsufficientCollateral)?;
        if balance == 0 {
            self.positions.remove(&(user, asset));
        } else {
            self.positions.insert((user, asset), balance);
        }
        Ok(balance)
    }

    /// Non-zero positions of `user`, ordered by asset key.
    pub fn positions_of<'a>(&'a self, user: &Pubkey) -> impl Iterator<Item = (Pubkey, u128)> + 'a {
        let lower = (*user, Pubkey::default());
        let upper = (*user, Pubkey::new_from_array([u8::MAX; 32]));
        self.positions
            .range(lower..=upper)
            .map(|((_, asset), amount)| (*asset, *amount))
    }

    /// Sum of every user's deposit of `asset`.
    pub fn total_deposited(&self, asset: &Pubkey) -> Result<u128> {
        self.positions
            .iter()
            .filter(|((_, held), _)| held == asset)
            .try_fold(0u128, |total, (_, amount)| {
                total.checked_add(*amount).ok_or_else(|| error!(DscError::MathOverflow))
            })
    }

    pub fn users(&self) -> impl Iterator<Item = Pubkey> + '_ {
        let mut last = None;
        self.positions.keys().filter_map(move |(user, _)| {
            if last == Some(*user) {
                None
            } else {
                last = Some(*user);
                Some(*user)
            }
        })
    }
}

/// Minted stable units per user, 18-decimal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DebtLedger {
    minted: BTreeMap<Pubkey, u128>,
}

impl DebtLedger {
    pub fn debt_of(&self, user: &Pubkey) -> u128 {
        self.minted.get(user).copied().unwrap_or(0)
    }

    pub fn increase(&mut self, user: Pubkey, amount: u128) -> Result<u128> {
        let debt = self
            .debt_of(&user)
            .checked_add(amount)
            .ok_or(DscError::MathOverflow)?;
        self.minted.insert(user, debt);
        Ok(debt)
    }

    pub fn decrease(&mut self, user: Pubkey, amount: u128) -> Result<u128> {
        let debt = self
            .debt_of(&user)
            .checked_sub(amount)
            .ok_or(DscError::InsufficientDebt)?;
        if debt == 0 {
            self.minted.remove(&user);
        } else {
            self.minted.insert(user, debt);
        }
        Ok(debt)
    }

    pub fn total_minted(&self) -> Result<u128> {
        self.minted.values().try_fold(0u128, |total, amount| {
            total.checked_add(*amount).ok_or_else(|| error!(DscError::MathOverflow))
        })
    }
}
