//! Handlers for the `/members` directory.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;
use tally_core::error::CoreError;
use tally_core::pagination::{Page, Pagination};
use tally_core::types::DbId;
use tally_db::models::member::{CreateMember, Member, MemberListQuery, UpdateMember};
use tally_db::repositories::MemberRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reject an email already held by another live member.
async fn ensure_email_free(pool: &PgPool, email: &str, exclude_id: Option<DbId>) -> AppResult<()> {
    if MemberRepo::find_by_email(pool, email, exclude_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A member with email '{email}' already exists"
        ))));
    }
    Ok(())
}

/// POST /api/v1/members
pub async fn create(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateMember>,
) -> AppResult<(StatusCode, Json<DataResponse<Member>>)> {
    let input = input.validate()?;
    ensure_email_free(&state.pool, &input.email, None).await?;

    let member = MemberRepo::create(&state.pool, &input).await?;
    tracing::info!(member_id = member.id, "Member created");

    Ok((StatusCode::CREATED, Json(DataResponse::new(member))))
}

/// GET /api/v1/members
pub async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MemberListQuery>,
) -> AppResult<Json<DataResponse<Page<Member>>>> {
    let (filter, page) = query.into_filter();
    let (items, total) = MemberRepo::list(&state.pool, &filter, page).await?;

    Ok(Json(DataResponse::new(Page {
        items,
        pagination: Pagination::new(page, total),
    })))
}

/// GET /api/v1/members/{id}
pub async fn get_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Member>>> {
    let member = MemberRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Member", id))?;
    Ok(Json(DataResponse::new(member)))
}

/// PUT /api/v1/members/{id}
///
/// Changing `hourly_rate` affects only entries recorded afterwards.
pub async fn update(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMember>,
) -> AppResult<Json<DataResponse<Member>>> {
    let input = input.validate()?;
    MemberRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Member", id))?;
    if let Some(email) = &input.email {
        ensure_email_free(&state.pool, email, Some(id)).await?;
    }

    let member = MemberRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Member", id))?;
    tracing::info!(member_id = id, "Member updated");

    Ok(Json(DataResponse::new(member)))
}

/// DELETE /api/v1/members/{id}
pub async fn delete(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if MemberRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(member_id = id, "Member deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Member", id))
    }
}
