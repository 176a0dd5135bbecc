//! HTTP-level integration tests for the `/projects` resource.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth};
use serde_json::json;
use sqlx::PgPool;

const OWNER: i64 = 1;
const STRANGER: i64 = 2;

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_project_returns_201_with_defaults(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/projects",
        OWNER,
        json!({ "name": "Website Renewal", "budget_amount": 1500000 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Website Renewal");
    assert_eq!(json["data"]["status"], "planning");
    assert_eq!(json["data"]["owner_id"], OWNER);
    assert!(json["data"]["id"].is_number());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_project_lists_every_field_error(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/projects",
        OWNER,
        json!({
            "name": "  ",
            "status": "archived",
            "start_date": "2024-05-01",
            "end_date": "2024-04-01",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"status"));
    assert!(fields.contains(&"end_date"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_project_includes_stats(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Stats").await;
    common::create_task(&pool, OWNER, project_id, 8.0).await;

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/projects/{project_id}"), OWNER).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Stats");
    assert_eq!(json["data"]["stats"]["total_tasks"], 1);
    assert_eq!(json["data"]["stats"]["total_planned_hours"], 8.0);
    assert_eq!(json["data"]["stats"]["completion_rate"], 0.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_project_changes_status(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Original").await;

    let app = common::build_test_app(pool);
    let response = put_json_auth(
        app,
        &format!("/api/v1/projects/{project_id}"),
        OWNER,
        json!({ "name": "Renamed", "status": "in_progress" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["status"], "in_progress");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleted_project_is_gone(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Delete Me").await;
    let uri = format!("/api/v1/projects/{project_id}");

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, OWNER).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(common::build_test_app(pool.clone()), &uri, OWNER).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(common::build_test_app(pool), "/api/v1/projects", OWNER).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["pagination"]["total"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_project_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/projects/999999", OWNER).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn list_is_scoped_to_owner_and_paginated(pool: PgPool) {
    for name in ["Alpha", "Beta", "Gamma"] {
        common::create_project(&pool, OWNER, name).await;
    }
    common::create_project(&pool, STRANGER, "Foreign").await;

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        "/api/v1/projects?per_page=2&sort=name&order=asc",
        OWNER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let items = json["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Alpha");
    assert_eq!(items[1]["name"], "Beta");
    assert_eq!(json["data"]["pagination"]["total"], 3);
    assert_eq!(json["data"]["pagination"]["total_pages"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_with_huge_page_number_is_empty_not_an_error(pool: PgPool) {
    common::create_project(&pool, OWNER, "Alpha").await;

    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/projects?page={}&per_page=100", i64::MAX);
    let response = get_auth(app, &uri, OWNER).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(json["data"]["pagination"]["page"], 1_000_000);
    assert_eq!(json["data"]["pagination"]["total"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_filters_by_search(pool: PgPool) {
    common::create_project(&pool, OWNER, "Mobile App").await;
    common::create_project(&pool, OWNER, "Website").await;

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/projects?search=mobile", OWNER).await;

    let json = body_json(response).await;
    let items = json["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Mobile App");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_sort_key_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/projects?sort=owner_id;DROP", OWNER).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn other_users_project_is_forbidden(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Private").await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{project_id}"),
        STRANGER,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/projects/{project_id}/budget"),
        STRANGER,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn summary_rolls_up_task_hours(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Rollup").await;
    let member_id = common::create_member(&pool, "Alice", "alice@example.com", 3000.0).await;
    let first = common::create_task(&pool, OWNER, project_id, 10.0).await;
    common::create_task(&pool, OWNER, project_id, 10.0).await;
    common::record_hours(&pool, first, member_id, "2024-04-01", 12.0).await;

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/tasks/{first}"),
        OWNER,
        json!({ "status": "completed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/projects/{project_id}/summary"), OWNER).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["project_id"], project_id);
    assert_eq!(data["total_tasks"], 2);
    assert_eq!(data["total_planned_hours"], 20.0);
    assert_eq!(data["total_actual_hours"], 12.0);
    assert_eq!(data["variance_hours"], -8.0);
    assert_eq!(data["variance_percentage"], -40.0);
    assert_eq!(data["completed_tasks"], 1);
    assert_eq!(data["todo_tasks"], 1);
    assert_eq!(data["completion_rate"], 50.0);
    assert_eq!(data["is_over_budget"], false);
}
