//! Handlers for project membership (`/projects/{id}/members`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tally_core::error::CoreError;
use tally_core::types::DbId;
use tally_db::models::project_member::{AssignMember, ProjectMember, ProjectMemberView};
use tally_db::repositories::{MemberRepo, ProjectMemberRepo};

use super::project::find_and_authorize;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/members
///
/// Active assignments only.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectMemberView>>>> {
    find_and_authorize(&state.pool, project_id, &auth).await?;
    let members = ProjectMemberRepo::list_active(&state.pool, project_id).await?;
    Ok(Json(DataResponse::new(members)))
}

/// POST /api/v1/projects/{id}/members
///
/// Without an explicit `hourly_rate_snapshot` the member's current rate is
/// frozen onto the assignment.
pub async fn assign(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AssignMember>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectMember>>)> {
    find_and_authorize(&state.pool, project_id, &auth).await?;
    let input = input.validate()?;

    let member = MemberRepo::find_by_id(&state.pool, input.member_id)
        .await?
        .ok_or(AppError::not_found("Member", input.member_id))?;

    if ProjectMemberRepo::find_active(&state.pool, project_id, member.id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Member {} is already assigned to project {project_id}",
            member.id
        ))));
    }

    let snapshot = input.hourly_rate_snapshot.or(Some(member.hourly_rate));
    let assignment = ProjectMemberRepo::assign(&state.pool, project_id, &input, snapshot).await?;

    tracing::info!(project_id, member_id = member.id, "Member assigned to project");

    Ok((StatusCode::CREATED, Json(DataResponse::new(assignment))))
}

/// DELETE /api/v1/projects/{id}/members/{member_id}
pub async fn remove(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_and_authorize(&state.pool, project_id, &auth).await?;

    if ProjectMemberRepo::remove(&state.pool, project_id, member_id).await? {
        tracing::info!(project_id, member_id, "Member removed from project");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Assignment", member_id))
    }
}
