//! Budget profit arithmetic.
//!
//! Revenue is set by the user; total cost is derived from the time ledger
//! and refreshed on every read. Profit and profit rate are recomputed from
//! both whenever either changes.

use serde::Serialize;

/// Currency assigned to newly created budgets unless configured otherwise.
pub const DEFAULT_CURRENCY: &str = "JPY";

/// The money fields of a budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BudgetFigures {
    pub revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub profit_rate: f64,
}

impl BudgetFigures {
    /// Build figures from revenue and cost with profit already computed.
    pub fn new(revenue: f64, total_cost: f64) -> Self {
        let mut figures = Self {
            revenue,
            total_cost,
            ..Self::default()
        };
        figures.calculate_profit();
        figures
    }

    /// `profit = revenue - total_cost`; `profit_rate` is profit as a
    /// percentage of revenue, 0 when revenue is not positive.
    pub fn calculate_profit(&mut self) {
        self.profit = self.revenue - self.total_cost;
        self.profit_rate = if self.revenue > 0.0 {
            self.profit / self.revenue * 100.0
        } else {
            0.0
        };
    }

    /// Replace the derived cost and recompute profit.
    pub fn with_total_cost(mut self, total_cost: f64) -> Self {
        self.total_cost = total_cost;
        self.calculate_profit();
        self
    }

    /// Replace the revenue and recompute profit.
    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self.calculate_profit();
        self
    }

    pub fn is_deficit(&self) -> bool {
        self.profit < 0.0
    }
}
