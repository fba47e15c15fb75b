use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Field, Record, RecordId};

use super::ValidationError;

/// Spending budget of a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: RecordId,
    /// Owning user; each user has at most one budget.
    pub user_id: RecordId,
    pub total: BigDecimal,
    pub spent: BigDecimal,
    pub remaining: BigDecimal,
}

/// Business rules a budget mutation can break.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BudgetError {
    #[error("Expense of {amount} exceeds the remaining budget of {remaining}")]
    Overspent {
        amount: BigDecimal,
        remaining: BigDecimal,
    },
    #[error("Limit {limit} is below the amount already spent ({spent})")]
    LimitBelowSpent { limit: BigDecimal, spent: BigDecimal },
}

impl Budget {
    /// Creates an untouched budget for `user_id`.
    pub fn new(user_id: RecordId, total: BigDecimal) -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            user_id,
            remaining: total.clone(),
            total,
            spent: BigDecimal::zero(),
        }
    }

    /// Records an expense, refusing any that would leave the remaining amount negative.
    pub fn apply_expense(&mut self, amount: &BigDecimal) -> Result<(), BudgetError> {
        let remaining = &self.remaining - amount;
        if remaining < BigDecimal::zero() {
            return Err(BudgetError::Overspent {
                amount: amount.clone(),
                remaining: self.remaining.clone(),
            });
        }
        self.spent = &self.spent + amount;
        self.remaining = remaining;
        Ok(())
    }

    /// Replaces the total, keeping what was already spent.
    pub fn apply_limit(&mut self, limit: &BigDecimal) -> Result<(), BudgetError> {
        if limit < &self.spent {
            return Err(BudgetError::LimitBelowSpent {
                limit: limit.clone(),
                spent: self.spent.clone(),
            });
        }
        self.total = limit.clone();
        self.remaining = limit - &self.spent;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetField {
    Id,
    UserId,
}

impl Field for BudgetField {
    fn name(self) -> &'static str {
        match self {
            BudgetField::Id => "id",
            BudgetField::UserId => "uid",
        }
    }

    fn is_unique(self) -> bool {
        true
    }
}

impl Record for Budget {
    type Field = BudgetField;
    const KIND: &'static str = "budget";
    const ID: BudgetField = BudgetField::Id;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn keys(&self) -> Vec<(BudgetField, String)> {
        vec![
            (BudgetField::Id, self.id.to_string()),
            (BudgetField::UserId, self.user_id.to_string()),
        ]
    }
}

/// Validates a caller-supplied money amount.
pub fn validate_amount(field: &'static str, amount: &BigDecimal) -> Result<(), ValidationError> {
    if amount > &BigDecimal::zero() {
        Ok(())
    } else {
        Err(ValidationError::NotPositive(field))
    }
}
