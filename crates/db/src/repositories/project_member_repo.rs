//! Repository for the `project_members` table (project assignments).

use sqlx::PgPool;
use tally_core::types::DbId;

use crate::models::project_member::{NewAssignment, ProjectMember, ProjectMemberView};

const COLUMNS: &str = "pm.id, pm.project_id, pm.member_id, pm.joined_at, pm.left_at, \
     pm.allocation_rate, pm.hourly_rate_snapshot, pm.created_at, pm.updated_at";

/// Provides assignment operations linking members to projects.
pub struct ProjectMemberRepo;

impl ProjectMemberRepo {
    /// Active assignments of a project with member identity, ordered by join date.
    pub async fn list_active(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectMemberView>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, m.name AS member_name, m.email AS member_email, \
                    m.role AS member_role \
             FROM project_members pm \
             JOIN members m ON m.id = pm.member_id AND m.deleted_at IS NULL \
             WHERE pm.project_id = $1 AND pm.left_at IS NULL \
             ORDER BY pm.joined_at ASC, pm.id ASC"
        );
        sqlx::query_as::<_, ProjectMemberView>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// The active assignment of `member_id` on `project_id`, if any.
    pub async fn find_active(
        pool: &PgPool,
        project_id: DbId,
        member_id: DbId,
    ) -> Result<Option<ProjectMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_members pm \
             WHERE pm.project_id = $1 AND pm.member_id = $2 AND pm.left_at IS NULL"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .bind(member_id)
            .fetch_optional(pool)
            .await
    }

    /// Create an active assignment with an already-resolved rate snapshot.
    ///
    /// A concurrent duplicate surfaces as a unique violation on
    /// `uq_project_members_active`.
    pub async fn assign(
        pool: &PgPool,
        project_id: DbId,
        input: &NewAssignment,
        hourly_rate_snapshot: Option<f64>,
    ) -> Result<ProjectMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_members AS pm \
                (project_id, member_id, joined_at, allocation_rate, hourly_rate_snapshot) \
             VALUES ($1, $2, COALESCE($3, CURRENT_DATE), $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .bind(input.member_id)
            .bind(input.joined_at)
            .bind(input.allocation_rate)
            .bind(hourly_rate_snapshot)
            .fetch_one(pool)
            .await
    }

    /// End the active assignment by stamping `left_at`. Returns `false` if
    /// there was no active assignment.
    pub async fn remove(
        pool: &PgPool,
        project_id: DbId,
        member_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE project_members SET left_at = CURRENT_DATE \
             WHERE project_id = $1 AND member_id = $2 AND left_at IS NULL",
        )
        .bind(project_id)
        .bind(member_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
