//! Budget models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::budget::BudgetFigures;
use tally_core::error::CoreError;
use tally_core::types::{DbId, Timestamp};
use tally_core::validation::{validate_currency, validate_non_negative, FieldErrors};

/// A row from the `budgets` table.
#[derive(Debug, Clone, FromRow)]
pub struct Budget {
    pub id: DbId,
    pub project_id: DbId,
    pub revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub profit_rate: f64,
    pub currency: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Budget {
    /// The stored money fields.
    pub fn figures(&self) -> BudgetFigures {
        BudgetFigures {
            revenue: self.revenue,
            total_cost: self.total_cost,
            profit: self.profit,
            profit_rate: self.profit_rate,
        }
    }
}

/// Budget as returned by the API; `is_deficit` is derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetView {
    pub id: DbId,
    pub project_id: DbId,
    pub revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub profit_rate: f64,
    pub currency: String,
    pub is_deficit: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Budget> for BudgetView {
    fn from(b: Budget) -> Self {
        let is_deficit = b.figures().is_deficit();
        Self {
            id: b.id,
            project_id: b.project_id,
            revenue: b.revenue,
            total_cost: b.total_cost,
            profit: b.profit,
            profit_rate: b.profit_rate,
            currency: b.currency,
            is_deficit,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// DTO for `PUT /api/v1/projects/{id}/budget/revenue`.
#[derive(Debug, Deserialize)]
pub struct UpdateRevenue {
    pub revenue: f64,
    pub currency: Option<String>,
}

impl UpdateRevenue {
    pub fn validate(self) -> Result<Self, CoreError> {
        let mut errors = FieldErrors::new();
        errors.check("revenue", validate_non_negative(self.revenue));
        if let Some(currency) = &self.currency {
            errors.check("currency", validate_currency(currency));
        }
        errors.finish()?;
        Ok(self)
    }
}
