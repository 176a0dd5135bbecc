//! Member entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::error::CoreError;
use tally_core::pagination::{PageRequest, DEFAULT_PER_PAGE};
use tally_core::types::{DbId, Timestamp};
use tally_core::validation::{
    validate_email, validate_non_negative, validate_optional_text, validate_required_text,
    FieldErrors, MAX_DEPARTMENT_LEN, MAX_MEMBER_NAME_LEN, MAX_ROLE_LEN,
};

/// A row from the `members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub hourly_rate: f64,
    pub department: Option<String>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The `{id, name}` pair embedded in task and time-entry views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberBrief {
    pub id: DbId,
    pub name: String,
}

impl MemberBrief {
    /// Build from a joined `(id, name)` pair when the join matched.
    pub fn from_parts(id: Option<DbId>, name: Option<String>) -> Option<Self> {
        Some(Self {
            id: id?,
            name: name?,
        })
    }
}

/// DTO for `POST /api/v1/members`.
#[derive(Debug, Deserialize)]
pub struct CreateMember {
    pub name: String,
    pub email: String,
    pub user_id: Option<DbId>,
    pub role: Option<String>,
    pub hourly_rate: Option<f64>,
    pub department: Option<String>,
}

/// Validated insert input for a member.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub user_id: Option<DbId>,
    pub role: Option<String>,
    pub hourly_rate: f64,
    pub department: Option<String>,
}

impl CreateMember {
    pub fn validate(self) -> Result<NewMember, CoreError> {
        let email = self.email.trim().to_string();
        let mut errors = FieldErrors::new();
        errors.check("name", validate_required_text(&self.name, MAX_MEMBER_NAME_LEN));
        errors.check("email", validate_email(&email));
        errors.check("role", validate_optional_text(self.role.as_deref(), MAX_ROLE_LEN));
        errors.check(
            "department",
            validate_optional_text(self.department.as_deref(), MAX_DEPARTMENT_LEN),
        );
        let hourly_rate = self.hourly_rate.unwrap_or(0.0);
        errors.check("hourly_rate", validate_non_negative(hourly_rate));
        errors.finish()?;

        Ok(NewMember {
            name: self.name.trim().to_string(),
            email,
            user_id: self.user_id,
            role: self.role,
            hourly_rate,
            department: self.department,
        })
    }
}

/// DTO for `PUT /api/v1/members/{id}`. All fields optional.
///
/// Changing `hourly_rate` affects only entries and assignments created
/// afterwards; existing snapshots are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMember {
    pub name: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<DbId>,
    pub role: Option<String>,
    pub hourly_rate: Option<f64>,
    pub department: Option<String>,
}

impl UpdateMember {
    /// Validate in place, normalising the email.
    pub fn validate(mut self) -> Result<Self, CoreError> {
        self.email = self.email.map(|e| e.trim().to_string());
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.check("name", validate_required_text(name, MAX_MEMBER_NAME_LEN));
        }
        if let Some(email) = &self.email {
            errors.check("email", validate_email(email));
        }
        errors.check("role", validate_optional_text(self.role.as_deref(), MAX_ROLE_LEN));
        errors.check(
            "department",
            validate_optional_text(self.department.as_deref(), MAX_DEPARTMENT_LEN),
        );
        if let Some(rate) = self.hourly_rate {
            errors.check("hourly_rate", validate_non_negative(rate));
        }
        errors.finish()?;
        self.name = self.name.map(|n| n.trim().to_string());
        Ok(self)
    }
}

/// Query parameters for `GET /api/v1/members`.
#[derive(Debug, Default, Deserialize)]
pub struct MemberListQuery {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub department: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Validated member list filter.
#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    pub search: Option<String>,
    pub department: Option<String>,
}

impl MemberListQuery {
    pub fn into_filter(self) -> (MemberFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.per_page, DEFAULT_PER_PAGE);
        let filter = MemberFilter {
            search: non_blank(self.search),
            department: non_blank(self.department),
        };
        (filter, page)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
