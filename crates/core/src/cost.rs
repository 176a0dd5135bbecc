//! Labor cost aggregation over a project's time entries.
//!
//! Inputs are flat [`CostFact`] rows (one per live time entry). All money is
//! computed from each entry's own rate snapshot, never from a member's
//! current rate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::time_ledger::entry_cost;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One time entry, reduced to what cost aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CostFact {
    pub member_id: DbId,
    pub member_name: String,
    pub hours: f64,
    pub hourly_rate_snapshot: Option<f64>,
}

impl CostFact {
    pub fn cost(&self) -> f64 {
        entry_cost(self.hours, self.hourly_rate_snapshot)
    }
}

// ---------------------------------------------------------------------------
// Project totals
// ---------------------------------------------------------------------------

/// Hours, cost, and effective average rate for a whole project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProjectCost {
    pub total_hours: f64,
    pub total_cost: f64,
    pub average_rate: f64,
}

pub fn project_cost_summary(facts: &[CostFact]) -> ProjectCost {
    let total_hours: f64 = facts.iter().map(|f| f.hours).sum();
    let total_cost: f64 = facts.iter().map(CostFact::cost).sum();
    ProjectCost {
        total_hours,
        total_cost,
        average_rate: ratio(total_cost, total_hours),
    }
}

// ---------------------------------------------------------------------------
// Per member
// ---------------------------------------------------------------------------

/// One member's share of the project's labor cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberCost {
    pub member_id: DbId,
    pub member_name: String,
    pub hours: f64,
    /// Unweighted mean of the member's snapshot rates (a "rate card" view,
    /// not hours-weighted). Entries without a snapshot are skipped.
    pub hourly_rate: f64,
    pub cost: f64,
    pub percentage: f64,
}

#[derive(Default)]
struct MemberAccumulator {
    name: String,
    hours: f64,
    cost: f64,
    rate_sum: f64,
    rate_count: u32,
}

/// Group facts by member, ordered by member id ascending.
///
/// `percentage` is the member's cost over `total_cost`, 0 when the project
/// has no cost at all.
pub fn member_cost_breakdown(facts: &[CostFact], total_cost: f64) -> Vec<MemberCost> {
    let mut by_member: BTreeMap<DbId, MemberAccumulator> = BTreeMap::new();

    for fact in facts {
        let acc = by_member.entry(fact.member_id).or_default();
        if acc.name.is_empty() {
            acc.name.clone_from(&fact.member_name);
        }
        acc.hours += fact.hours;
        acc.cost += fact.cost();
        if let Some(rate) = fact.hourly_rate_snapshot {
            acc.rate_sum += rate;
            acc.rate_count += 1;
        }
    }

    by_member
        .into_iter()
        .map(|(member_id, acc)| MemberCost {
            member_id,
            member_name: acc.name,
            hours: acc.hours,
            hourly_rate: ratio(acc.rate_sum, f64::from(acc.rate_count)),
            cost: acc.cost,
            percentage: ratio(acc.cost, total_cost) * 100.0,
        })
        .collect()
}

/// `numerator / denominator`, 0 when the denominator is 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
