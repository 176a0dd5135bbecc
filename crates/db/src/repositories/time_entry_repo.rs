//! Repository for the `time_entries` table: the time ledger.
//!
//! Every write runs in one transaction that also resyncs the owning task's
//! `actual_hours` to the sum of its entries. Locks are always taken task
//! first, then entry.

use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tally_core::cost::CostFact;
use tally_core::pagination::PageRequest;
use tally_core::time_ledger::{revision_adjustment, HourAdjustment};
use tally_core::types::DbId;

use super::task_repo::TaskRepo;
use crate::models::task::Task;
use crate::models::time_entry::{
    CostFactRow, NewTimeEntry, TimeEntry, TimeEntryChanges, TimeEntryFilter, TimeEntryWithMember,
};

const COLUMNS: &str = "e.id, e.task_id, e.member_id, e.user_id, e.work_date, e.hours, \
     e.hourly_rate_snapshot, e.comment, e.created_at, e.updated_at";

/// Entries are visible only while their task and project are live.
const VISIBLE_JOIN: &str = "JOIN tasks t ON t.id = e.task_id AND t.deleted_at IS NULL \
     JOIN projects p ON p.id = t.project_id AND p.deleted_at IS NULL";

/// `$1` project, `$2` task, `$3` member, `$4`/`$5` inclusive work-date bounds.
const LIST_FILTER: &str = "WHERE ($1::BIGINT IS NULL OR t.project_id = $1) \
       AND ($2::BIGINT IS NULL OR e.task_id = $2) \
       AND ($3::BIGINT IS NULL OR e.member_id = $3) \
       AND ($4::DATE IS NULL OR e.work_date >= $4) \
       AND ($5::DATE IS NULL OR e.work_date <= $5)";

/// Result of [`TimeEntryRepo::record`].
#[derive(Debug)]
pub enum RecordOutcome {
    Recorded(TimeEntry),
    TaskNotFound,
    MemberNotFound,
}

/// Provides the time ledger operations.
pub struct TimeEntryRepo;

impl TimeEntryRepo {
    /// Record hours against a task, snapshotting the member's current rate.
    ///
    /// The task row is locked for the whole transaction; the insert and the
    /// `actual_hours` resync commit together or not at all.
    pub async fn record(
        pool: &PgPool,
        user_id: DbId,
        input: &NewTimeEntry,
    ) -> Result<RecordOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(task) = TaskRepo::lock_for_update(&mut *tx, input.task_id).await? else {
            return Ok(RecordOutcome::TaskNotFound);
        };

        let rate: Option<f64> = sqlx::query_scalar(
            "SELECT hourly_rate FROM members WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(input.member_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(hourly_rate_snapshot) = rate else {
            return Ok(RecordOutcome::MemberNotFound);
        };

        let query = format!(
            "INSERT INTO time_entries AS e \
                (task_id, member_id, user_id, work_date, hours, hourly_rate_snapshot, comment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, TimeEntry>(&query)
            .bind(input.task_id)
            .bind(input.member_id)
            .bind(user_id)
            .bind(input.work_date)
            .bind(input.hours)
            .bind(hourly_rate_snapshot)
            .bind(&input.comment)
            .fetch_one(&mut *tx)
            .await?;

        let adjustment = HourAdjustment::Record { hours: entry.hours };
        TaskRepo::apply_ledger_change(&mut *tx, &task, adjustment).await?;

        tx.commit().await?;
        Ok(RecordOutcome::Recorded(entry))
    }

    /// Revise an entry's date, hours or comment. The rate snapshot is never
    /// changed. When hours change, the task's total is resynced.
    ///
    /// Returns `None` if the entry is not visible.
    pub async fn revise(
        pool: &PgPool,
        id: DbId,
        changes: &TimeEntryChanges,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some((entry, task)) = Self::lock_with_task(&mut tx, id).await? else {
            return Ok(None);
        };

        let adjustment = revision_adjustment(entry.hours, changes.hours);

        let query = format!(
            "UPDATE time_entries AS e SET \
                work_date = COALESCE($2, work_date), \
                hours = COALESCE($3, hours), \
                comment = COALESCE($4, comment) \
             WHERE e.id = $1 \
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, TimeEntry>(&query)
            .bind(id)
            .bind(changes.work_date)
            .bind(changes.hours)
            .bind(&changes.comment)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(adjustment) = adjustment {
            TaskRepo::apply_ledger_change(&mut *tx, &task, adjustment).await?;
        }

        tx.commit().await?;
        Ok(Some(entry))
    }

    /// Delete an entry and resync the task's total.
    ///
    /// Returns `false` if the entry is not visible (including a second
    /// delete of the same entry), in which case nothing is adjusted.
    pub async fn remove(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some((entry, task)) = Self::lock_with_task(&mut tx, id).await? else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM time_entries WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let adjustment = HourAdjustment::Remove { hours: entry.hours };
        TaskRepo::apply_ledger_change(&mut *tx, &task, adjustment).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Lock the owning task, then the entry. `None` if either is gone.
    async fn lock_with_task(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<(TimeEntry, Task)>, sqlx::Error> {
        let task_id: Option<DbId> =
            sqlx::query_scalar("SELECT task_id FROM time_entries WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some(task_id) = task_id else {
            return Ok(None);
        };

        let Some(task) = TaskRepo::lock_for_update(&mut **tx, task_id).await? else {
            return Ok(None);
        };

        let query = format!("SELECT {COLUMNS} FROM time_entries e WHERE e.id = $1 FOR UPDATE");
        let entry = sqlx::query_as::<_, TimeEntry>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(entry.map(|entry| (entry, task)))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a visible entry with its member's name.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TimeEntryWithMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, m.name AS member_name \
             FROM time_entries e {VISIBLE_JOIN} \
             LEFT JOIN members m ON m.id = e.member_id \
             WHERE e.id = $1"
        );
        sqlx::query_as::<_, TimeEntryWithMember>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List visible entries, most recent work date first, with the total
    /// match count.
    pub async fn list(
        pool: &PgPool,
        filter: &TimeEntryFilter,
        page: PageRequest,
    ) -> Result<(Vec<TimeEntryWithMember>, i64), sqlx::Error> {
        let count_query =
            format!("SELECT COUNT(*) FROM time_entries e {VISIBLE_JOIN} {LIST_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(filter.project_id)
            .bind(filter.task_id)
            .bind(filter.member_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(pool)
            .await?;

        let query = format!(
            "SELECT {COLUMNS}, m.name AS member_name \
             FROM time_entries e {VISIBLE_JOIN} \
             LEFT JOIN members m ON m.id = e.member_id \
             {LIST_FILTER} \
             ORDER BY e.work_date DESC, e.id DESC \
             LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, TimeEntryWithMember>(&query)
            .bind(filter.project_id)
            .bind(filter.task_id)
            .bind(filter.member_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Every entry counting toward a project's labor cost: entries on the
    /// project's live tasks, whatever the member's current state.
    pub async fn cost_facts_for_project<'e, E>(
        executor: E,
        project_id: DbId,
    ) -> Result<Vec<CostFact>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, CostFactRow>(
            "SELECT e.member_id, m.name AS member_name, e.hours, e.hourly_rate_snapshot \
             FROM time_entries e \
             JOIN tasks t ON t.id = e.task_id AND t.deleted_at IS NULL \
             JOIN members m ON m.id = e.member_id \
             WHERE t.project_id = $1 \
             ORDER BY e.member_id, e.id",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(CostFact::from).collect())
    }
}
