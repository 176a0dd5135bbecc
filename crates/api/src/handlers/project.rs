//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;
use tally_core::error::CoreError;
use tally_core::pagination::{Page, Pagination};
use tally_core::types::DbId;
use tally_core::variance::project_variance;
use tally_db::models::project::{
    CreateProject, Project, ProjectDetail, ProjectListQuery, ProjectStats, ProjectSummaryView,
    ProjectView, UpdateProject,
};
use tally_db::repositories::{ProjectRepo, TaskRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a live project and verify the caller owns it.
///
/// Every project-scoped handler (tasks, assignments, budget) goes through here.
pub(crate) async fn find_and_authorize(
    pool: &PgPool,
    project_id: DbId,
    auth: &AuthUser,
) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or(AppError::not_found("Project", project_id))?;

    if project.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this project".into(),
        )));
    }

    Ok(project)
}

/// POST /api/v1/projects
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectView>>)> {
    let input = input.validate()?;
    let project = ProjectRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(project_id = project.id, owner_id = auth.user_id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(ProjectView::from(project))),
    ))
}

/// GET /api/v1/projects
///
/// Lists the caller's own projects.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> AppResult<Json<DataResponse<Page<ProjectView>>>> {
    let (filter, page) = query.validate()?;
    let (rows, total) = ProjectRepo::list(&state.pool, auth.user_id, &filter, page).await?;

    Ok(Json(DataResponse::new(Page {
        items: rows.into_iter().map(ProjectView::from).collect(),
        pagination: Pagination::new(page, total),
    })))
}

/// GET /api/v1/projects/{id}
///
/// Includes headline task statistics.
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let project = find_and_authorize(&state.pool, id, &auth).await?;
    let tasks = TaskRepo::task_hours_for_project(&state.pool, id).await?;
    let variance = project_variance(tasks);

    Ok(Json(DataResponse::new(ProjectDetail {
        project: ProjectView::from(project),
        stats: ProjectStats::from(&variance),
    })))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let current = find_and_authorize(&state.pool, id, &auth).await?;
    let changes = input.validate(&current)?;

    let project = ProjectRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::not_found("Project", id))?;

    tracing::info!(project_id = id, "Project updated");

    Ok(Json(DataResponse::new(ProjectView::from(project))))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_and_authorize(&state.pool, id, &auth).await?;

    if ProjectRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(project_id = id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Project", id))
    }
}

/// GET /api/v1/projects/{id}/summary
///
/// Planned-vs-actual rollup over the project's live tasks.
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectSummaryView>>> {
    find_and_authorize(&state.pool, id, &auth).await?;
    let tasks = TaskRepo::task_hours_for_project(&state.pool, id).await?;

    Ok(Json(DataResponse::new(ProjectSummaryView {
        project_id: id,
        variance: project_variance(tasks),
    })))
}
