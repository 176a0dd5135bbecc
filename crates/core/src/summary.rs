//! Project-level budget report composition.
//!
//! Combines the budget (already refreshed by the caller), the labor cost
//! totals and the per-member breakdown into one response, attaching a
//! warning when the project is in deficit.

use serde::Serialize;

use crate::cost::{member_cost_breakdown, project_cost_summary, CostFact, MemberCost};
use crate::types::DbId;

/// Shown on budget summaries whose profit is negative.
pub const DEFICIT_WARNING: &str =
    "Warning: this project is running at a deficit. Increase revenue or reduce costs.";

/// Labor cost totals for the project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub labor_cost: f64,
    pub total_hours: f64,
    pub average_rate: f64,
}

/// The full budget report for one project.
///
/// `B` is the presentation shape of the budget itself, so the report can be
/// composed here without knowing about database rows.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetSummary<B> {
    pub project_id: DbId,
    pub project_name: String,
    pub budget: B,
    pub cost_breakdown: CostBreakdown,
    pub member_costs: Vec<MemberCost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
}

/// The deficit notice, present only when `is_deficit`.
pub fn deficit_warning(is_deficit: bool) -> Option<String> {
    is_deficit.then(|| DEFICIT_WARNING.to_string())
}

/// Assemble the report from the refreshed budget and the project's cost facts.
pub fn compose_budget_summary<B>(
    project_id: DbId,
    project_name: String,
    budget: B,
    is_deficit: bool,
    facts: &[CostFact],
) -> BudgetSummary<B> {
    let totals = project_cost_summary(facts);
    BudgetSummary {
        project_id,
        project_name,
        budget,
        cost_breakdown: CostBreakdown {
            labor_cost: totals.total_cost,
            total_hours: totals.total_hours,
            average_rate: totals.average_rate,
        },
        member_costs: member_cost_breakdown(facts, totals.total_cost),
        warning_message: deficit_warning(is_deficit),
    }
}
