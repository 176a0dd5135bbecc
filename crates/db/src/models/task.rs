//! Task entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::error::CoreError;
use tally_core::pagination::{PageRequest, DEFAULT_PER_PAGE};
use tally_core::status::{StatusId, TaskStatus};
use tally_core::types::{Date, DbId, Timestamp};
use tally_core::validation::{
    parse_optional_date, validate_date_range, validate_non_negative, validate_optional_text,
    validate_required_text, FieldErrors, MAX_NAME_LEN,
};
use tally_core::variance::{task_variance, TaskHours};

use super::member::MemberBrief;

const MAX_DESCRIPTION_LEN: usize = 5000;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    pub assigned_to: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub status_id: StatusId,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_id(self.status_id).unwrap_or_default()
    }
}

/// A task joined with its assignee's name.
#[derive(Debug, Clone, FromRow)]
pub struct TaskWithAssignee {
    #[sqlx(flatten)]
    pub task: Task,
    pub assignee_name: Option<String>,
}

/// The per-task columns the project rollup reads.
#[derive(Debug, Clone, FromRow)]
pub struct TaskHoursRow {
    pub status_id: StatusId,
    pub planned_hours: f64,
    pub actual_hours: f64,
}

impl From<TaskHoursRow> for TaskHours {
    fn from(row: TaskHoursRow) -> Self {
        TaskHours {
            status: TaskStatus::from_id(row.status_id).unwrap_or_default(),
            planned_hours: row.planned_hours,
            actual_hours: row.actual_hours,
        }
    }
}

/// Task as returned by the API, with variance computed at read time.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: DbId,
    pub project_id: DbId,
    pub assigned_to: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub variance_hours: f64,
    pub variance_percentage: f64,
    pub status: TaskStatus,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<MemberBrief>,
}

impl From<TaskWithAssignee> for TaskView {
    fn from(row: TaskWithAssignee) -> Self {
        let t = row.task;
        let variance = task_variance(t.planned_hours, t.actual_hours);
        let status = t.status();
        Self {
            id: t.id,
            project_id: t.project_id,
            assigned_to: t.assigned_to,
            name: t.name,
            description: t.description,
            planned_hours: t.planned_hours,
            actual_hours: t.actual_hours,
            variance_hours: variance.variance_hours,
            variance_percentage: variance.variance_percentage,
            status,
            start_date: t.start_date,
            end_date: t.end_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
            assignee: MemberBrief::from_parts(t.assigned_to, row.assignee_name),
        }
    }
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

/// DTO for `POST /api/v1/projects/{id}/tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub name: String,
    pub description: Option<String>,
    pub assigned_to: Option<DbId>,
    pub planned_hours: Option<f64>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validated insert input for a task. `actual_hours` always starts at 0.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub assigned_to: Option<DbId>,
    pub planned_hours: f64,
    pub status: TaskStatus,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl CreateTask {
    pub fn validate(self) -> Result<NewTask, CoreError> {
        let mut errors = FieldErrors::new();
        errors.check("name", validate_required_text(&self.name, MAX_NAME_LEN));
        errors.check(
            "description",
            validate_optional_text(self.description.as_deref(), MAX_DESCRIPTION_LEN),
        );
        let planned_hours = self.planned_hours.unwrap_or(0.0);
        errors.check("planned_hours", validate_non_negative(planned_hours));
        let status = errors
            .check("status", parse_status(self.status.as_deref()))
            .flatten();
        let start_date = errors
            .check("start_date", parse_optional_date(self.start_date.as_deref()))
            .flatten();
        let end_date = errors
            .check("end_date", parse_optional_date(self.end_date.as_deref()))
            .flatten();
        errors.check("end_date", validate_date_range(start_date, end_date));
        errors.finish()?;

        Ok(NewTask {
            name: self.name.trim().to_string(),
            description: self.description,
            assigned_to: self.assigned_to,
            planned_hours,
            status: status.unwrap_or_default(),
            start_date,
            end_date,
        })
    }
}

/// DTO for `PUT /api/v1/tasks/{id}`.
///
/// Has no `actual_hours` field: that column moves only through the time
/// ledger or an explicit reconcile.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<DbId>,
    pub planned_hours: Option<f64>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validated patch for a task.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<DbId>,
    pub planned_hours: Option<f64>,
    pub status: Option<TaskStatus>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl UpdateTask {
    pub fn validate(self, current: &Task) -> Result<TaskChanges, CoreError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.check("name", validate_required_text(name, MAX_NAME_LEN));
        }
        errors.check(
            "description",
            validate_optional_text(self.description.as_deref(), MAX_DESCRIPTION_LEN),
        );
        if let Some(hours) = self.planned_hours {
            errors.check("planned_hours", validate_non_negative(hours));
        }
        let status = errors
            .check("status", parse_status(self.status.as_deref()))
            .flatten();
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

        Ok(TaskChanges {
            name: self.name.map(|n| n.trim().to_string()),
            description: self.description,
            assigned_to: self.assigned_to,
            planned_hours: self.planned_hours,
            status,
            start_date,
            end_date,
        })
    }
}

fn parse_status(value: Option<&str>) -> Result<Option<TaskStatus>, String> {
    value
        .map(|s| {
            TaskStatus::parse(s).ok_or_else(|| format!("must be one of: {}", TaskStatus::allowed()))
        })
        .transpose()
}

/// Query parameters for `GET /api/v1/projects/{id}/tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl TaskListQuery {
    pub fn validate(self) -> Result<(Option<TaskStatus>, PageRequest), CoreError> {
        let mut errors = FieldErrors::new();
        let status = errors
            .check("status", parse_status(self.status.as_deref()))
            .flatten();
        errors.finish()?;
        Ok((
            status,
            PageRequest::new(self.page, self.per_page, DEFAULT_PER_PAGE),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(planned: f64, actual: f64, assignee: Option<(DbId, &str)>) -> TaskWithAssignee {
        let now = Utc::now();
        TaskWithAssignee {
            task: Task {
                id: 1,
                project_id: 1,
                assigned_to: assignee.map(|(id, _)| id),
                name: "Design".into(),
                description: None,
                planned_hours: planned,
                actual_hours: actual,
                status_id: TaskStatus::InProgress.id(),
                start_date: None,
                end_date: None,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            },
            assignee_name: assignee.map(|(_, name)| name.to_string()),
        }
    }

    #[test]
    fn view_carries_variance() {
        let view = TaskView::from(row(10.0, 8.0, None));
        assert_eq!(view.variance_hours, -2.0);
        assert_eq!(view.variance_percentage, -20.0);
        assert_eq!(view.status, TaskStatus::InProgress);
        assert!(view.assignee.is_none());
    }

    #[test]
    fn view_embeds_assignee() {
        let view = TaskView::from(row(0.0, 3.0, Some((4, "Sato"))));
        assert_eq!(view.variance_percentage, 0.0);
        assert_eq!(view.assignee.unwrap().name, "Sato");
    }

    #[test]
    fn create_defaults() {
        let task = CreateTask {
            name: "Build".into(),
            description: None,
            assigned_to: None,
            planned_hours: None,
            status: None,
            start_date: None,
            end_date: None,
        }
        .validate()
        .unwrap();
        assert_eq!(task.planned_hours, 0.0);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let query = TaskListQuery {
            status: Some("done".into()),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }
}
