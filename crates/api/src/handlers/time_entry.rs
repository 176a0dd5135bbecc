//! Handlers for the `/time-entries` ledger.
//!
//! Every mutation here also moves the owning task's `actual_hours`; the
//! repository does both in one transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;
use tally_core::pagination::{Page, Pagination};
use tally_core::time_ledger::entry_totals;
use tally_core::types::DbId;
use tally_db::models::time_entry::{
    CreateTimeEntry, TimeEntryListQuery, TimeEntryPage, TimeEntryView, UpdateTimeEntry,
};
use tally_db::repositories::time_entry_repo::RecordOutcome;
use tally_db::repositories::TimeEntryRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

async fn load_view(pool: &PgPool, id: DbId) -> AppResult<TimeEntryView> {
    let row = TimeEntryRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::not_found("TimeEntry", id))?;
    Ok(TimeEntryView::from(row))
}

/// POST /api/v1/time-entries
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTimeEntry>,
) -> AppResult<(StatusCode, Json<DataResponse<TimeEntryView>>)> {
    let input = input.validate()?;

    let entry = match TimeEntryRepo::record(&state.pool, auth.user_id, &input).await? {
        RecordOutcome::Recorded(entry) => entry,
        RecordOutcome::TaskNotFound => return Err(AppError::not_found("Task", input.task_id)),
        RecordOutcome::MemberNotFound => {
            return Err(AppError::not_found("Member", input.member_id))
        }
    };

    tracing::info!(
        time_entry_id = entry.id,
        task_id = entry.task_id,
        hours = entry.hours,
        "Time entry recorded"
    );

    let view = load_view(&state.pool, entry.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(view))))
}

/// GET /api/v1/time-entries
///
/// `summary` totals cover the returned page only.
pub async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TimeEntryListQuery>,
) -> AppResult<Json<DataResponse<TimeEntryPage>>> {
    let (filter, page) = query.validate()?;
    let (rows, total) = TimeEntryRepo::list(&state.pool, &filter, page).await?;

    let summary = entry_totals(
        rows.iter()
            .map(|r| (r.entry.hours, r.entry.hourly_rate_snapshot)),
    );

    Ok(Json(DataResponse::new(TimeEntryPage {
        page: Page {
            items: rows.into_iter().map(TimeEntryView::from).collect(),
            pagination: Pagination::new(page, total),
        },
        summary,
    })))
}

/// GET /api/v1/time-entries/{id}
pub async fn get_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TimeEntryView>>> {
    Ok(Json(DataResponse::new(load_view(&state.pool, id).await?)))
}

/// PUT /api/v1/time-entries/{id}
pub async fn update(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTimeEntry>,
) -> AppResult<Json<DataResponse<TimeEntryView>>> {
    let changes = input.validate()?;

    TimeEntryRepo::revise(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::not_found("TimeEntry", id))?;
    tracing::info!(time_entry_id = id, "Time entry revised");

    Ok(Json(DataResponse::new(load_view(&state.pool, id).await?)))
}

/// DELETE /api/v1/time-entries/{id}
pub async fn delete(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if TimeEntryRepo::remove(&state.pool, id).await? {
        tracing::info!(time_entry_id = id, "Time entry removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("TimeEntry", id))
    }
}
