//! Repository for the `tasks` table.
//!
//! `actual_hours` is written only by [`TaskRepo::sync_actual_hours`]: the
//! time ledger calls it inside its transaction, and
//! [`TaskRepo::reconcile_actual_hours`] calls it on demand. Either way the
//! value is the sum of the task's entries, never an accumulated delta.

use sqlx::{PgExecutor, PgPool};
use tally_core::pagination::PageRequest;
use tally_core::status::TaskStatus;
use tally_core::time_ledger::{has_drifted, HourAdjustment};
use tally_core::types::DbId;
use tally_core::variance::TaskHours;

use crate::models::task::{NewTask, Task, TaskChanges, TaskHoursRow, TaskWithAssignee};

const COLUMNS: &str = "t.id, t.project_id, t.assigned_to, t.name, t.description, \
     t.planned_hours, t.actual_hours, t.status_id, t.start_date, t.end_date, \
     t.deleted_at, t.created_at, t.updated_at";

/// A task is live when neither it nor its project is soft-deleted.
const LIVE: &str = "t.deleted_at IS NULL AND EXISTS \
     (SELECT 1 FROM projects p WHERE p.id = t.project_id AND p.deleted_at IS NULL)";

/// Provides CRUD and hour bookkeeping for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task under `project_id`. `actual_hours` starts at 0.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        input: &NewTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks AS t \
                (project_id, assigned_to, name, description, planned_hours, status_id, \
                 start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .bind(input.assigned_to)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.planned_hours)
            .bind(input.status.id())
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_one(pool)
            .await
    }

    /// Find a live task by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks t WHERE t.id = $1 AND {LIVE}");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live task by ID together with its assignee's name.
    pub async fn find_with_assignee(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TaskWithAssignee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, m.name AS assignee_name \
             FROM tasks t LEFT JOIN members m ON m.id = t.assigned_to \
             WHERE t.id = $1 AND {LIVE}"
        );
        sqlx::query_as::<_, TaskWithAssignee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's live tasks, newest first, with the total match count.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        status: Option<TaskStatus>,
        page: PageRequest,
    ) -> Result<(Vec<TaskWithAssignee>, i64), sqlx::Error> {
        let status_id = status.map(|s| s.id());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks \
             WHERE project_id = $1 AND deleted_at IS NULL \
               AND ($2::SMALLINT IS NULL OR status_id = $2)",
        )
        .bind(project_id)
        .bind(status_id)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS}, m.name AS assignee_name \
             FROM tasks t LEFT JOIN members m ON m.id = t.assigned_to \
             WHERE t.project_id = $1 AND t.deleted_at IS NULL \
               AND ($2::SMALLINT IS NULL OR t.status_id = $2) \
             ORDER BY t.created_at DESC, t.id DESC \
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, TaskWithAssignee>(&query)
            .bind(project_id)
            .bind(status_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Status and hour columns of every live task in a project.
    pub async fn task_hours_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<TaskHours>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskHoursRow>(
            "SELECT status_id, planned_hours, actual_hours FROM tasks \
             WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(TaskHours::from).collect())
    }

    /// Update a task. Only non-`None` fields are applied; `actual_hours` is
    /// never touched here.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &TaskChanges,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks AS t SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                assigned_to = COALESCE($4, assigned_to), \
                planned_hours = COALESCE($5, planned_hours), \
                status_id = COALESCE($6, status_id), \
                start_date = COALESCE($7, start_date), \
                end_date = COALESCE($8, end_date) \
             WHERE t.id = $1 AND {LIVE} \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.assigned_to)
            .bind(input.planned_hours)
            .bind(input.status.map(|s| s.id()))
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a task. Its time entries stay but stop counting toward cost.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Hour bookkeeping (transaction participants)
    // -----------------------------------------------------------------------

    /// Lock a live task row for the rest of the caller's transaction.
    pub async fn lock_for_update<'e, E>(executor: E, id: DbId) -> Result<Option<Task>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query =
            format!("SELECT {COLUMNS} FROM tasks t WHERE t.id = $1 AND {LIVE} FOR UPDATE OF t");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Rewrite `actual_hours` as the sum of the task's time entries and
    /// return the new value. Callers hold the row lock.
    pub async fn sync_actual_hours<'e, E>(executor: E, id: DbId) -> Result<f64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "UPDATE tasks SET actual_hours = ( \
                 SELECT COALESCE(SUM(hours), 0)::DOUBLE PRECISION \
                 FROM time_entries WHERE task_id = $1) \
             WHERE id = $1 \
             RETURNING actual_hours",
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Sync `actual_hours` after a ledger write on the locked `task`,
    /// warning if the stored total had drifted from what `adjustment`
    /// predicted.
    pub async fn apply_ledger_change<'e, E>(
        executor: E,
        task: &Task,
        adjustment: HourAdjustment,
    ) -> Result<f64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let expected = adjustment.apply(task.actual_hours);
        let synced = Self::sync_actual_hours(executor, task.id).await?;
        if has_drifted(expected, synced) {
            tracing::warn!(
                task_id = task.id,
                expected,
                ledger = synced,
                "Task actual hours had drifted from time ledger; resynced"
            );
        }
        Ok(synced)
    }

    /// Recompute `actual_hours` from the task's time entries.
    ///
    /// Returns `None` if the task is not live. Logs a warning when the stored
    /// total had drifted from the ledger.
    pub async fn reconcile_actual_hours(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(task) = Self::lock_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };

        let ledger_hours = Self::sync_actual_hours(&mut *tx, id).await?;
        if has_drifted(task.actual_hours, ledger_hours) {
            tracing::warn!(
                task_id = id,
                stored = task.actual_hours,
                ledger = ledger_hours,
                "Task actual hours drifted from time ledger; reconciled"
            );
        }

        let task = Task {
            actual_hours: ledger_hours,
            ..task
        };

        tx.commit().await?;
        Ok(Some(task))
    }
}
