//! Project entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::error::CoreError;
use tally_core::pagination::{PageRequest, DEFAULT_PROJECT_PER_PAGE};
use tally_core::status::{ProjectStatus, StatusId};
use tally_core::types::{Date, DbId, Timestamp};
use tally_core::validation::{
    parse_optional_date, validate_date_range, validate_non_negative, validate_optional_text,
    validate_required_text, FieldErrors, MAX_NAME_LEN,
};
use tally_core::variance::ProjectVariance;

/// Maximum length of a project description.
const MAX_DESCRIPTION_LEN: usize = 5000;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status_id: StatusId,
    pub budget_amount: Option<f64>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn status(&self) -> ProjectStatus {
        ProjectStatus::from_id(self.status_id).unwrap_or_default()
    }
}

/// Project as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub budget_amount: Option<f64>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Project> for ProjectView {
    fn from(p: Project) -> Self {
        let status = p.status();
        Self {
            id: p.id,
            owner_id: p.owner_id,
            name: p.name,
            description: p.description,
            status,
            budget_amount: p.budget_amount,
            start_date: p.start_date,
            end_date: p.end_date,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Headline task statistics attached to a single-project response.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub total_planned_hours: f64,
    pub total_actual_hours: f64,
    pub completion_rate: f64,
}

impl From<&ProjectVariance> for ProjectStats {
    fn from(v: &ProjectVariance) -> Self {
        Self {
            total_tasks: v.total_tasks,
            completed_tasks: v.completed_tasks,
            total_planned_hours: v.total_planned_hours,
            total_actual_hours: v.total_actual_hours,
            completion_rate: v.completion_rate,
        }
    }
}

/// `GET /api/v1/projects/{id}` response body.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectView,
    pub stats: ProjectStats,
}

/// `GET /api/v1/projects/{id}/summary` response body.
#[derive(Debug, Serialize)]
pub struct ProjectSummaryView {
    pub project_id: DbId,
    #[serde(flatten)]
    pub variance: ProjectVariance,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// DTO for `POST /api/v1/projects`.
#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub budget_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validated insert input for a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub budget_amount: Option<f64>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl CreateProject {
    pub fn validate(self) -> Result<NewProject, CoreError> {
        let mut errors = FieldErrors::new();
        errors.check("name", validate_required_text(&self.name, MAX_NAME_LEN));
        errors.check(
            "description",
            validate_optional_text(self.description.as_deref(), MAX_DESCRIPTION_LEN),
        );
        let status = errors
            .check("status", parse_status(self.status.as_deref()))
            .flatten();
        if let Some(amount) = self.budget_amount {
            errors.check("budget_amount", validate_non_negative(amount));
        }
        let start_date = errors
            .check("start_date", parse_optional_date(self.start_date.as_deref()))
            .flatten();
        let end_date = errors
            .check("end_date", parse_optional_date(self.end_date.as_deref()))
            .flatten();
        errors.check("end_date", validate_date_range(start_date, end_date));
        errors.finish()?;

        Ok(NewProject {
            name: self.name.trim().to_string(),
            description: self.description,
            status: status.unwrap_or_default(),
            budget_amount: self.budget_amount,
            start_date,
            end_date,
        })
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// DTO for `PUT /api/v1/projects/{id}`. All fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub budget_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validated patch for a project; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget_amount: Option<f64>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl UpdateProject {
    /// Validate against the stored row so a one-sided date change still
    /// respects the range.
    pub fn validate(self, current: &Project) -> Result<ProjectChanges, CoreError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.check("name", validate_required_text(name, MAX_NAME_LEN));
        }
        errors.check(
            "description",
            validate_optional_text(self.description.as_deref(), MAX_DESCRIPTION_LEN),
        );
        let status = errors
            .check("status", parse_status(self.status.as_deref()))
            .flatten();
        if let Some(amount) = self.budget_amount {
            errors.check("budget_amount", validate_non_negative(amount));
        }
        let start_date = errors
            .check("start_date", parse_optional_date(self.start_date.as_deref()))
            .flatten();
        let end_date = errors
            .check("end_date", parse_optional_date(self.end_date.as_deref()))
            .flatten();
        errors.check(
            "end_date",
            validate_date_range(
                start_date.or(current.start_date),
                end_date.or(current.end_date),
            ),
        );
        errors.finish()?;

        Ok(ProjectChanges {
            name: self.name.map(|n| n.trim().to_string()),
            description: self.description,
            status,
            budget_amount: self.budget_amount,
            start_date,
            end_date,
        })
    }
}

fn parse_status(value: Option<&str>) -> Result<Option<ProjectStatus>, String> {
    value
        .map(|s| {
            ProjectStatus::parse(s)
                .ok_or_else(|| format!("must be one of: {}", ProjectStatus::allowed()))
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/v1/projects`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<String>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    /// One of `created_at`, `name`, `status`, `updated_at`.
    pub sort: Option<String>,
    /// `asc` or `desc` (default `desc`).
    pub order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Whitelisted sort columns for project lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectSort {
    #[default]
    CreatedAt,
    Name,
    Status,
    UpdatedAt,
}

impl ProjectSort {
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Name => "name",
            Self::Status => "status_id",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(Self::CreatedAt),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated project list filter.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
    pub sort: ProjectSort,
    pub order: SortOrder,
}

impl ProjectListQuery {
    pub fn validate(self) -> Result<(ProjectFilter, PageRequest), CoreError> {
        let mut errors = FieldErrors::new();
        let status = errors
            .check("status", parse_status(self.status.as_deref()))
            .flatten();
        let sort = match self.sort.as_deref() {
            None => ProjectSort::default(),
            Some(s) => ProjectSort::parse(s).unwrap_or_else(|| {
                errors.push("sort", "must be one of: created_at, name, status, updated_at");
                ProjectSort::default()
            }),
        };
        let order = match self.order.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(_) => {
                errors.push("order", "must be one of: asc, desc");
                SortOrder::Desc
            }
        };
        errors.finish()?;

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let page = PageRequest::new(self.page, self.per_page, DEFAULT_PROJECT_PER_PAGE);
        Ok((
            ProjectFilter {
                status,
                search,
                sort,
                order,
            },
            page,
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn create(name: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            description: None,
            status: None,
            budget_amount: None,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn create_defaults_to_planning() {
        let input = create("  Website  ").validate().unwrap();
        assert_eq!(input.name, "Website");
        assert_eq!(input.status, ProjectStatus::Planning);
    }

    #[test]
    fn create_collects_all_field_errors() {
        let mut dto = create("");
        dto.status = Some("archived".into());
        dto.budget_amount = Some(-1.0);
        dto.start_date = Some("2024-05-01".into());
        dto.end_date = Some("2024-04-01".into());

        assert_matches!(dto.validate(), Err(CoreError::InvalidInput(errors)) => {
            let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["name", "status", "budget_amount", "end_date"]);
        });
    }

    #[test]
    fn list_query_rejects_unknown_sort() {
        let query = ProjectListQuery {
            sort: Some("owner".into()),
            ..Default::default()
        };
        assert_matches!(query.validate(), Err(CoreError::InvalidInput(_)));
    }

    #[test]
    fn list_query_defaults() {
        let (filter, page) = ProjectListQuery::default().validate().unwrap();
        assert_eq!(filter.sort, ProjectSort::CreatedAt);
        assert_eq!(filter.order, SortOrder::Desc);
        assert_eq!(page.per_page, DEFAULT_PROJECT_PER_PAGE);
    }
}
