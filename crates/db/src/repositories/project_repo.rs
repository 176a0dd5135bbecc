//! Repository for the `projects` table.

use sqlx::PgPool;
use tally_core::pagination::PageRequest;
use tally_core::types::DbId;

use crate::models::project::{NewProject, Project, ProjectChanges, ProjectFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, name, description, status_id, budget_amount, \
     start_date, end_date, deleted_at, created_at, updated_at";

/// Shared `WHERE` clause for owner-scoped, filtered listings.
///
/// `$1` owner, `$2` status id, `$3` search pattern.
const LIST_FILTER: &str = "WHERE owner_id = $1 AND deleted_at IS NULL \
       AND ($2::SMALLINT IS NULL OR status_id = $2) \
       AND ($3::TEXT IS NULL OR name ILIKE $3 OR description ILIKE $3)";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project owned by `owner_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &NewProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects \
                (owner_id, name, description, status_id, budget_amount, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.id())
            .bind(input.budget_amount)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one owner's projects with filters, sorting and pagination.
    ///
    /// Returns the page of rows and the total number of matching rows.
    pub async fn list(
        pool: &PgPool,
        owner_id: DbId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> Result<(Vec<Project>, i64), sqlx::Error> {
        let status_id = filter.status.map(|s| s.id());
        let pattern = filter.search.as_deref().map(like_pattern);

        let count_query = format!("SELECT COUNT(*) FROM projects {LIST_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(owner_id)
            .bind(status_id)
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

        // Sort column and direction come from whitelisted enums, never from raw input.
        let query = format!(
            "SELECT {COLUMNS} FROM projects {LIST_FILTER} \
             ORDER BY {} {}, id {} \
             LIMIT $4 OFFSET $5",
            filter.sort.column(),
            filter.order.keyword(),
            filter.order.keyword(),
        );
        let rows = sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .bind(status_id)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &ProjectChanges,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                status_id = COALESCE($4, status_id), \
                budget_amount = COALESCE($5, budget_amount), \
                start_date = COALESCE($6, start_date), \
                end_date = COALESCE($7, end_date) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.map(|s| s.id()))
            .bind(input.budget_amount)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a project by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Wrap a search term for `ILIKE`, escaping its wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("web"), "%web%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
