//! Project assignment models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::error::CoreError;
use tally_core::types::{Date, DbId, Timestamp};
use tally_core::validation::{
    parse_optional_date, validate_non_negative, validate_unit_range, FieldErrors,
};

/// A row from the `project_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectMember {
    pub id: DbId,
    pub project_id: DbId,
    pub member_id: DbId,
    pub joined_at: Date,
    pub left_at: Option<Date>,
    pub allocation_rate: f64,
    pub hourly_rate_snapshot: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An active assignment joined with the member's identity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectMemberView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: ProjectMember,
    pub member_name: String,
    pub member_email: String,
    pub member_role: Option<String>,
}

/// DTO for `POST /api/v1/projects/{id}/members`.
#[derive(Debug, Deserialize)]
pub struct AssignMember {
    pub member_id: DbId,
    pub joined_at: Option<String>,
    pub allocation_rate: Option<f64>,
    /// Overrides the member's current rate when supplied.
    pub hourly_rate_snapshot: Option<f64>,
}

/// Validated assignment input. `hourly_rate_snapshot` is resolved by the
/// caller against the member's current rate.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub member_id: DbId,
    pub joined_at: Option<Date>,
    pub allocation_rate: f64,
    pub hourly_rate_snapshot: Option<f64>,
}

impl AssignMember {
    pub fn validate(self) -> Result<NewAssignment, CoreError> {
        let mut errors = FieldErrors::new();
        let joined_at = errors
            .check("joined_at", parse_optional_date(self.joined_at.as_deref()))
            .flatten();
        let allocation_rate = self.allocation_rate.unwrap_or(1.0);
        errors.check("allocation_rate", validate_unit_range(allocation_rate));
        if let Some(rate) = self.hourly_rate_snapshot {
            errors.check("hourly_rate_snapshot", validate_non_negative(rate));
        }
        errors.finish()?;

        Ok(NewAssignment {
            member_id: self.member_id,
            joined_at,
            allocation_rate,
            hourly_rate_snapshot: self.hourly_rate_snapshot,
        })
    }
}
