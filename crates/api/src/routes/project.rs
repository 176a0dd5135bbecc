//! Route definitions for the `/projects` resource and everything nested
//! under a project.

use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::{assignment, budget, project, task};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list  (?status, search, sort, order, page, per_page)
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
/// GET    /{id}/summary              -> summary
/// GET    /{id}/tasks                -> task::list_by_project  (?status, page, per_page)
/// POST   /{id}/tasks                -> task::create
/// GET    /{id}/members              -> assignment::list
/// POST   /{id}/members              -> assignment::assign
/// DELETE /{id}/members/{member_id}  -> assignment::remove
/// GET    /{id}/budget               -> budget::get
/// PUT    /{id}/budget/revenue       -> budget::set_revenue
/// GET    /{id}/budget/summary       -> budget::summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/summary", get(project::summary))
        .route(
            "/{id}/tasks",
            get(task::list_by_project).post(task::create),
        )
        .route(
            "/{id}/members",
            get(assignment::list).post(assignment::assign),
        )
        .route("/{id}/members/{member_id}", delete(assignment::remove))
        .route("/{id}/budget", get(budget::get))
        .route("/{id}/budget/revenue", put(budget::set_revenue))
        .route("/{id}/budget/summary", get(budget::summary))
}
