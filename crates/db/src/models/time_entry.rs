//! Time entry models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::cost::CostFact;
use tally_core::error::CoreError;
use tally_core::pagination::{Page, PageRequest, DEFAULT_PER_PAGE};
use tally_core::time_ledger::{entry_cost, EntryTotals};
use tally_core::types::{Date, DbId, Timestamp};
use tally_core::validation::{
    parse_date, parse_optional_date, validate_date_range, validate_entry_hours,
    validate_optional_text, FieldErrors,
};

use super::member::MemberBrief;

const MAX_COMMENT_LEN: usize = 2000;

/// A row from the `time_entries` table.
#[derive(Debug, Clone, FromRow)]
pub struct TimeEntry {
    pub id: DbId,
    pub task_id: DbId,
    pub member_id: DbId,
    pub user_id: DbId,
    pub work_date: Date,
    pub hours: f64,
    pub hourly_rate_snapshot: Option<f64>,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TimeEntry {
    pub fn cost(&self) -> f64 {
        entry_cost(self.hours, self.hourly_rate_snapshot)
    }
}

/// A time entry joined with the recording member's name.
#[derive(Debug, Clone, FromRow)]
pub struct TimeEntryWithMember {
    #[sqlx(flatten)]
    pub entry: TimeEntry,
    pub member_name: Option<String>,
}

/// Time entry as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryView {
    pub id: DbId,
    pub task_id: DbId,
    pub member_id: DbId,
    pub user_id: DbId,
    pub work_date: Date,
    pub hours: f64,
    pub hourly_rate_snapshot: Option<f64>,
    pub cost: f64,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberBrief>,
}

impl From<TimeEntryWithMember> for TimeEntryView {
    fn from(row: TimeEntryWithMember) -> Self {
        let e = row.entry;
        let cost = e.cost();
        Self {
            id: e.id,
            task_id: e.task_id,
            member_id: e.member_id,
            user_id: e.user_id,
            work_date: e.work_date,
            hours: e.hours,
            hourly_rate_snapshot: e.hourly_rate_snapshot,
            cost,
            comment: e.comment,
            created_at: e.created_at,
            updated_at: e.updated_at,
            member: MemberBrief::from_parts(Some(e.member_id), row.member_name),
        }
    }
}

/// `GET /api/v1/time-entries` response body: a page plus totals over it.
#[derive(Debug, Serialize)]
pub struct TimeEntryPage {
    #[serde(flatten)]
    pub page: Page<TimeEntryView>,
    pub summary: EntryTotals,
}

/// The columns cost aggregation reads for one entry.
#[derive(Debug, Clone, FromRow)]
pub struct CostFactRow {
    pub member_id: DbId,
    pub member_name: String,
    pub hours: f64,
    pub hourly_rate_snapshot: Option<f64>,
}

impl From<CostFactRow> for CostFact {
    fn from(row: CostFactRow) -> Self {
        CostFact {
            member_id: row.member_id,
            member_name: row.member_name,
            hours: row.hours,
            hourly_rate_snapshot: row.hourly_rate_snapshot,
        }
    }
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

/// DTO for `POST /api/v1/time-entries`.
#[derive(Debug, Deserialize)]
pub struct CreateTimeEntry {
    pub task_id: DbId,
    pub member_id: DbId,
    pub work_date: String,
    pub hours: f64,
    pub comment: Option<String>,
}

/// Validated insert input. The rate snapshot is supplied separately by the
/// caller from the member's current rate.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub task_id: DbId,
    pub member_id: DbId,
    pub work_date: Date,
    pub hours: f64,
    pub comment: Option<String>,
}

impl CreateTimeEntry {
    pub fn validate(self) -> Result<NewTimeEntry, CoreError> {
        let mut errors = FieldErrors::new();
        let work_date = errors.check("work_date", parse_date(&self.work_date));
        errors.check("hours", validate_entry_hours(self.hours));
        errors.check(
            "comment",
            validate_optional_text(self.comment.as_deref(), MAX_COMMENT_LEN),
        );
        errors.finish()?;
        let work_date =
            work_date.ok_or_else(|| CoreError::Validation("work_date is required".into()))?;

        Ok(NewTimeEntry {
            task_id: self.task_id,
            member_id: self.member_id,
            work_date,
            hours: self.hours,
            comment: self.comment,
        })
    }
}

/// DTO for `PUT /api/v1/time-entries/{id}`. The snapshot rate is not editable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTimeEntry {
    pub work_date: Option<String>,
    pub hours: Option<f64>,
    pub comment: Option<String>,
}

/// Validated patch for a time entry.
#[derive(Debug, Clone, Default)]
pub struct TimeEntryChanges {
    pub work_date: Option<Date>,
    pub hours: Option<f64>,
    pub comment: Option<String>,
}

impl UpdateTimeEntry {
    pub fn validate(self) -> Result<TimeEntryChanges, CoreError> {
        let mut errors = FieldErrors::new();
        let work_date = errors
            .check("work_date", parse_optional_date(self.work_date.as_deref()))
            .flatten();
        if let Some(hours) = self.hours {
            errors.check("hours", validate_entry_hours(hours));
        }
        errors.check(
            "comment",
            validate_optional_text(self.comment.as_deref(), MAX_COMMENT_LEN),
        );
        errors.finish()?;

        Ok(TimeEntryChanges {
            work_date,
            hours: self.hours,
            comment: self.comment,
        })
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/v1/time-entries`.
#[derive(Debug, Default, Deserialize)]
pub struct TimeEntryListQuery {
    pub project_id: Option<DbId>,
    pub task_id: Option<DbId>,
    pub member_id: Option<DbId>,
    /// Inclusive lower bound on `work_date`.
    pub start_date: Option<String>,
    /// Inclusive upper bound on `work_date`.
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Validated time entry filter.
#[derive(Debug, Clone, Default)]
pub struct TimeEntryFilter {
    pub project_id: Option<DbId>,
    pub task_id: Option<DbId>,
    pub member_id: Option<DbId>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl TimeEntryListQuery {
    pub fn validate(self) -> Result<(TimeEntryFilter, PageRequest), CoreError> {
        let mut errors = FieldErrors::new();
        let start_date = errors
            .check("start_date", parse_optional_date(self.start_date.as_deref()))
            .flatten();
        let end_date = errors
            .check("end_date", parse_optional_date(self.end_date.as_deref()))
            .flatten();
        errors.check("end_date", validate_date_range(start_date, end_date));
        errors.finish()?;

        Ok((
            TimeEntryFilter {
                project_id: self.project_id,
                task_id: self.task_id,
                member_id: self.member_id,
                start_date,
                end_date,
            },
            PageRequest::new(self.page, self.per_page, DEFAULT_PER_PAGE),
        ))
    }
}
