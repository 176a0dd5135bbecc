//! Repository for the `budgets` table: the budget ledger.
//!
//! A project's budget row is created lazily on first access. `total_cost`
//! is never trusted from storage: every read or write recomputes it from
//! the time ledger under the budget row lock before returning.

use sqlx::{PgPool, Postgres, Transaction};
use tally_core::budget::BudgetFigures;
use tally_core::cost::{project_cost_summary, CostFact};
use tally_core::types::DbId;

use super::time_entry_repo::TimeEntryRepo;
use crate::models::budget::Budget;

const COLUMNS: &str = "id, project_id, revenue, total_cost, profit, profit_rate, currency, \
     created_at, updated_at";

/// Provides the budget ledger operations.
pub struct BudgetRepo;

impl BudgetRepo {
    /// Get the project's budget, creating a zero budget in `default_currency`
    /// on first access, with `total_cost` and profit refreshed from the ledger.
    ///
    /// The row is only rewritten when the figures changed, so repeated reads
    /// with no ledger writes in between return identical rows.
    pub async fn get_or_create(
        pool: &PgPool,
        project_id: DbId,
        default_currency: &str,
    ) -> Result<Budget, sqlx::Error> {
        let (budget, _) = Self::report(pool, project_id, default_currency).await?;
        Ok(budget)
    }

    /// Like [`BudgetRepo::get_or_create`], also returning the cost facts the
    /// refreshed `total_cost` was computed from. Both come from one
    /// transaction, so a breakdown built from the facts always sums to the
    /// budget's cost.
    pub async fn report(
        pool: &PgPool,
        project_id: DbId,
        default_currency: &str,
    ) -> Result<(Budget, Vec<CostFact>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let budget = Self::lock_or_create(&mut tx, project_id, default_currency).await?;
        let facts = TimeEntryRepo::cost_facts_for_project(&mut *tx, project_id).await?;
        let figures = budget
            .figures()
            .with_total_cost(project_cost_summary(&facts).total_cost);

        let budget = if figures == budget.figures() {
            budget
        } else {
            Self::write_figures(&mut tx, budget.id, &figures, &budget.currency).await?
        };

        tx.commit().await?;
        Ok((budget, facts))
    }

    /// Set the revenue (and optionally the currency), refreshing
    /// `total_cost` in the same transaction so the stored row is never stale.
    pub async fn set_revenue(
        pool: &PgPool,
        project_id: DbId,
        revenue: f64,
        currency: Option<&str>,
        default_currency: &str,
    ) -> Result<Budget, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let budget = Self::lock_or_create(&mut tx, project_id, default_currency).await?;
        let facts = TimeEntryRepo::cost_facts_for_project(&mut *tx, project_id).await?;
        let figures = budget
            .figures()
            .with_total_cost(project_cost_summary(&facts).total_cost)
            .with_revenue(revenue);
        let currency = currency.unwrap_or(&budget.currency);

        let budget = Self::write_figures(&mut tx, budget.id, &figures, currency).await?;

        tx.commit().await?;
        Ok(budget)
    }

    /// Insert the zero budget if missing, then lock the row.
    async fn lock_or_create(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        default_currency: &str,
    ) -> Result<Budget, sqlx::Error> {
        sqlx::query(
            "INSERT INTO budgets (project_id, currency) VALUES ($1, $2) \
             ON CONFLICT (project_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(default_currency)
        .execute(&mut **tx)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM budgets WHERE project_id = $1 FOR UPDATE");
        sqlx::query_as::<_, Budget>(&query)
            .bind(project_id)
            .fetch_one(&mut **tx)
            .await
    }

    async fn write_figures(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        figures: &BudgetFigures,
        currency: &str,
    ) -> Result<Budget, sqlx::Error> {
        let query = format!(
            "UPDATE budgets SET \
                revenue = $2, total_cost = $3, profit = $4, profit_rate = $5, currency = $6 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(id)
            .bind(figures.revenue)
            .bind(figures.total_cost)
            .bind(figures.profit)
            .bind(figures.profit_rate)
            .bind(currency)
            .fetch_one(&mut **tx)
            .await
    }
}
