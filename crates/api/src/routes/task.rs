//! Route definitions for the `/tasks` resource.
//!
//! Creation and listing are project-scoped and live under `/projects`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::task;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /{id}                   -> get_by_id
/// PUT    /{id}                   -> update
/// DELETE /{id}                   -> delete
/// POST   /{id}/reconcile-hours   -> reconcile_hours
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(task::get_by_id).put(task::update).delete(task::delete),
        )
        .route("/{id}/reconcile-hours", post(task::reconcile_hours))
}
