//! Repository for the `members` table.

use sqlx::PgPool;
use tally_core::pagination::PageRequest;
use tally_core::types::DbId;

use super::project_repo::like_pattern;
use crate::models::member::{Member, MemberFilter, NewMember, UpdateMember};

const COLUMNS: &str = "id, user_id, name, email, role, hourly_rate, department, \
     deleted_at, created_at, updated_at";

/// `$1` search pattern, `$2` department.
const LIST_FILTER: &str = "WHERE deleted_at IS NULL \
       AND ($1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1) \
       AND ($2::TEXT IS NULL OR department = $2)";

/// Provides CRUD operations for members.
pub struct MemberRepo;

impl MemberRepo {
    pub async fn create(pool: &PgPool, input: &NewMember) -> Result<Member, sqlx::Error> {
        let query = format!(
            "INSERT INTO members (user_id, name, email, role, hourly_rate, department) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.role)
            .bind(input.hourly_rate)
            .bind(&input.department)
            .fetch_one(pool)
            .await
    }

    /// Find a live member by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Member>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM members WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live member holding `email`, optionally ignoring one member ID
    /// (the member being updated).
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
        exclude_id: Option<DbId>,
    ) -> Result<Option<Member>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM members \
             WHERE email = $1 AND deleted_at IS NULL \
               AND ($2::BIGINT IS NULL OR id <> $2)"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(email)
            .bind(exclude_id)
            .fetch_optional(pool)
            .await
    }

    /// List live members ordered by name, with the total match count.
    pub async fn list(
        pool: &PgPool,
        filter: &MemberFilter,
        page: PageRequest,
    ) -> Result<(Vec<Member>, i64), sqlx::Error> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let count_query = format!("SELECT COUNT(*) FROM members {LIST_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(&pattern)
            .bind(&filter.department)
            .fetch_one(pool)
            .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM members {LIST_FILTER} \
             ORDER BY name ASC, id ASC \
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, Member>(&query)
            .bind(&pattern)
            .bind(&filter.department)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Update a member. Only non-`None` fields are applied. Existing rate
    /// snapshots on time entries and assignments are not touched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMember,
    ) -> Result<Option<Member>, sqlx::Error> {
        let query = format!(
            "UPDATE members SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                user_id = COALESCE($4, user_id), \
                role = COALESCE($5, role), \
                hourly_rate = COALESCE($6, hourly_rate), \
                department = COALESCE($7, department) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(input.user_id)
            .bind(&input.role)
            .bind(input.hourly_rate)
            .bind(&input.department)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a member. Their recorded time entries keep counting toward cost.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
