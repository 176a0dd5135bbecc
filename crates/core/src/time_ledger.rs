//! Time ledger rules: entry cost and task hour bookkeeping.
//!
//! A time entry freezes the member's hourly rate at creation. Its cost is
//! always computed from that snapshot, so later rate changes never alter
//! recorded history. After every ledger mutation the repository rewrites the
//! owning task's `actual_hours` as the sum of its entries, inside the same
//! transaction. The delta computed here is the value that sum is expected
//! to match; a mismatch means the stored total had drifted.

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

/// Cost of one entry: `hours * snapshot`, or 0 when no snapshot was captured.
pub fn entry_cost(hours: f64, hourly_rate_snapshot: Option<f64>) -> f64 {
    match hourly_rate_snapshot {
        Some(rate) => hours * rate,
        None => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Hour deltas
// ---------------------------------------------------------------------------

/// The change a ledger mutation applies to its task's `actual_hours`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HourAdjustment {
    /// A new entry was recorded.
    Record { hours: f64 },
    /// An entry's hours were revised.
    Revise { old_hours: f64, new_hours: f64 },
    /// An entry was removed.
    Remove { hours: f64 },
}

impl HourAdjustment {
    /// Signed delta for `actual_hours`.
    pub fn delta(self) -> f64 {
        match self {
            Self::Record { hours } => hours,
            Self::Revise {
                old_hours,
                new_hours,
            } => new_hours - old_hours,
            Self::Remove { hours } => -hours,
        }
    }

    /// `true` when applying this adjustment would not change the task.
    pub fn is_noop(self) -> bool {
        self.delta() == 0.0
    }

    /// Apply to the task's current total. The result never goes below zero,
    /// which absorbs drift from rows edited outside the ledger.
    pub fn apply(self, current_actual_hours: f64) -> f64 {
        (current_actual_hours + self.delta()).max(0.0)
    }
}

/// Tolerance for comparing hour totals summed in different orders.
pub const HOUR_TOLERANCE: f64 = 1e-6;

/// `true` when `expected` and the ledger sum disagree beyond float noise.
pub fn has_drifted(expected: f64, ledger_hours: f64) -> bool {
    (expected - ledger_hours).abs() > HOUR_TOLERANCE
}

/// Build the revision adjustment, or `None` when hours were not supplied or
/// did not change. Work-date and comment edits never touch task hours.
pub fn revision_adjustment(old_hours: f64, new_hours: Option<f64>) -> Option<HourAdjustment> {
    let new_hours = new_hours?;
    let adjustment = HourAdjustment::Revise {
        old_hours,
        new_hours,
    };
    (!adjustment.is_noop()).then_some(adjustment)
}

// ---------------------------------------------------------------------------
// Page summary
// ---------------------------------------------------------------------------

/// Totals over one page of listed entries.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct EntryTotals {
    pub total_hours: f64,
    pub total_cost: f64,
}

/// Sum hours and snapshot cost over `(hours, snapshot)` pairs.
pub fn entry_totals<I>(entries: I) -> EntryTotals
where
    I: IntoIterator<Item = (f64, Option<f64>)>,
{
    entries
        .into_iter()
        .fold(EntryTotals::default(), |mut acc, (hours, rate)| {
            acc.total_hours += hours;
            acc.total_cost += entry_cost(hours, rate);
            acc
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
