//! Planned-vs-actual hour variance for tasks and whole projects.

use serde::Serialize;

use crate::status::TaskStatus;

// ---------------------------------------------------------------------------
// Per task
// ---------------------------------------------------------------------------

/// Hour variance of a single task (or of a project's hour totals).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Variance {
    pub variance_hours: f64,
    pub variance_percentage: f64,
}

/// `actual - planned`, and that as a percentage of `planned`.
///
/// A zero plan yields a 0% variance rather than dividing by zero.
pub fn task_variance(planned_hours: f64, actual_hours: f64) -> Variance {
    let variance_hours = actual_hours - planned_hours;
    let variance_percentage = if planned_hours == 0.0 {
        0.0
    } else {
        variance_hours / planned_hours * 100.0
    };
    Variance {
        variance_hours,
        variance_percentage,
    }
}

// ---------------------------------------------------------------------------
// Per project
// ---------------------------------------------------------------------------

/// The per-task facts the project rollup needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskHours {
    pub status: TaskStatus,
    pub planned_hours: f64,
    pub actual_hours: f64,
}

/// Task counts and hour sums for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectVariance {
    pub total_tasks: i64,
    pub total_planned_hours: f64,
    pub total_actual_hours: f64,
    pub variance_hours: f64,
    pub variance_percentage: f64,
    pub is_over_budget: bool,
    pub completed_tasks: i64,
    pub in_progress_tasks: i64,
    pub todo_tasks: i64,
    pub blocked_tasks: i64,
    pub completion_rate: f64,
}

/// Fold a project's live tasks into counts, sums and rates.
pub fn project_variance<I>(tasks: I) -> ProjectVariance
where
    I: IntoIterator<Item = TaskHours>,
{
    let mut total_tasks = 0_i64;
    let mut total_planned_hours = 0.0;
    let mut total_actual_hours = 0.0;
    let (mut todo, mut in_progress, mut completed, mut blocked) = (0_i64, 0_i64, 0_i64, 0_i64);

    for task in tasks {
        total_tasks += 1;
        total_planned_hours += task.planned_hours;
        total_actual_hours += task.actual_hours;
        match task.status {
            TaskStatus::Todo => todo += 1,
            TaskStatus::InProgress => in_progress += 1,
            TaskStatus::Completed => completed += 1,
            TaskStatus::Blocked => blocked += 1,
        }
    }

    let variance = task_variance(total_planned_hours, total_actual_hours);

    ProjectVariance {
        total_tasks,
        total_planned_hours,
        total_actual_hours,
        variance_hours: variance.variance_hours,
        variance_percentage: variance.variance_percentage,
        is_over_budget: variance.variance_hours > 0.0,
        completed_tasks: completed,
        in_progress_tasks: in_progress,
        todo_tasks: todo,
        blocked_tasks: blocked,
        completion_rate: completion_rate(completed, total_tasks),
    }
}

/// `completed / total * 100`, 0 for an empty project.
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
