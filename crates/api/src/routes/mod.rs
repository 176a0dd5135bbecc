pub mod health;
pub mod member;
pub mod project;
pub mod task;
pub mod time_entry;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route below requires a Bearer token.
///
/// ```text
/// /projects                                 list, create
/// /projects/{id}                            get, update, delete
/// /projects/{id}/summary                    hour variance rollup
/// /projects/{id}/tasks                      list, create
/// /projects/{id}/members                    list active, assign
/// /projects/{id}/members/{member_id}        remove assignment
/// /projects/{id}/budget                     get (refreshed)
/// /projects/{id}/budget/revenue             set revenue (PUT)
/// /projects/{id}/budget/summary             budget report
///
/// /tasks/{id}                               get, update, delete
/// /tasks/{id}/reconcile-hours               recompute actual_hours (POST)
///
/// /members                                  list, create
/// /members/{id}                             get, update, delete
///
/// /time-entries                             list, record
/// /time-entries/{id}                        get, revise, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/tasks", task::router())
        .nest("/members", member::router())
        .nest("/time-entries", time_entry::router())
}
