//! Handlers for tasks: project-scoped creation and listing plus the
//! `/tasks/{id}` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;
use tally_core::pagination::{Page, Pagination};
use tally_core::types::DbId;
use tally_db::models::task::{CreateTask, Task, TaskListQuery, TaskView, UpdateTask};
use tally_db::repositories::{MemberRepo, TaskRepo};

use super::project::find_and_authorize;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a live task and verify the caller owns its project.
async fn find_task_and_authorize(pool: &PgPool, id: DbId, auth: &AuthUser) -> AppResult<Task> {
    let task = TaskRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    find_and_authorize(pool, task.project_id, auth).await?;
    Ok(task)
}

async fn ensure_member_exists(pool: &PgPool, member_id: Option<DbId>) -> AppResult<()> {
    if let Some(member_id) = member_id {
        MemberRepo::find_by_id(pool, member_id)
            .await?
            .ok_or(AppError::not_found("Member", member_id))?;
    }
    Ok(())
}

async fn load_view(pool: &PgPool, id: DbId) -> AppResult<TaskView> {
    let row = TaskRepo::find_with_assignee(pool, id)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    Ok(TaskView::from(row))
}

/// POST /api/v1/projects/{project_id}/tasks
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<DataResponse<TaskView>>)> {
    find_and_authorize(&state.pool, project_id, &auth).await?;
    let input = input.validate()?;
    ensure_member_exists(&state.pool, input.assigned_to).await?;

    let task = TaskRepo::create(&state.pool, project_id, &input).await?;
    tracing::info!(task_id = task.id, project_id, "Task created");

    let view = load_view(&state.pool, task.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(view))))
}

/// GET /api/v1/projects/{project_id}/tasks
pub async fn list_by_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<DataResponse<Page<TaskView>>>> {
    find_and_authorize(&state.pool, project_id, &auth).await?;
    let (status, page) = query.validate()?;
    let (rows, total) = TaskRepo::list_by_project(&state.pool, project_id, status, page).await?;

    Ok(Json(DataResponse::new(Page {
        items: rows.into_iter().map(TaskView::from).collect(),
        pagination: Pagination::new(page, total),
    })))
}

/// GET /api/v1/tasks/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    find_task_and_authorize(&state.pool, id, &auth).await?;
    Ok(Json(DataResponse::new(load_view(&state.pool, id).await?)))
}

/// PUT /api/v1/tasks/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    let current = find_task_and_authorize(&state.pool, id, &auth).await?;
    let changes = input.validate(&current)?;
    ensure_member_exists(&state.pool, changes.assigned_to).await?;

    TaskRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    tracing::info!(task_id = id, "Task updated");

    Ok(Json(DataResponse::new(load_view(&state.pool, id).await?)))
}

/// DELETE /api/v1/tasks/{id}
///
/// The task's time entries are kept but stop counting toward project cost.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_task_and_authorize(&state.pool, id, &auth).await?;

    if TaskRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(task_id = id, "Task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Task", id))
    }
}

/// POST /api/v1/tasks/{id}/reconcile-hours
///
/// Recompute `actual_hours` from the time ledger.
pub async fn reconcile_hours(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    find_task_and_authorize(&state.pool, id, &auth).await?;

    let task = TaskRepo::reconcile_actual_hours(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    tracing::info!(task_id = id, actual_hours = task.actual_hours, "Task hours reconciled");

    Ok(Json(DataResponse::new(load_view(&state.pool, id).await?)))
}
