//! HTTP-level integration tests for the budget ledger and budget report.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, put_json_auth};
use serde_json::json;
use sqlx::PgPool;

const OWNER: i64 = 1;

async fn set_revenue(pool: &PgPool, project_id: i64, body: serde_json::Value) -> serde_json::Value {
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{project_id}/budget/revenue"),
        OWNER,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn budget(pool: &PgPool, project_id: i64) -> serde_json::Value {
    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{project_id}/budget"),
        OWNER,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn first_read_creates_zero_budget(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Fresh").await;

    let json = budget(&pool, project_id).await;
    let data = &json["data"];
    assert_eq!(data["revenue"], 0.0);
    assert_eq!(data["total_cost"], 0.0);
    assert_eq!(data["profit"], 0.0);
    assert_eq!(data["profit_rate"], 0.0);
    assert_eq!(data["currency"], "JPY");
    assert_eq!(data["is_deficit"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn revenue_and_cost_give_profit(pool: PgPool) {
    // One task, 8h at 5000, revenue 100000.
    let project_id = common::create_project(&pool, OWNER, "Scenario A").await;
    let member_id = common::create_member(&pool, "Alice", "alice@example.com", 5000.0).await;
    let task_id = common::create_task(&pool, OWNER, project_id, 10.0).await;
    common::record_hours(&pool, task_id, member_id, "2024-04-01", 8.0).await;

    let json = set_revenue(&pool, project_id, json!({ "revenue": 100000 })).await;
    let data = &json["data"];
    assert_eq!(data["total_cost"], 40000.0);
    assert_eq!(data["profit"], 60000.0);
    assert_eq!(data["profit_rate"], 60.0);
    assert_eq!(data["is_deficit"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn zero_revenue_with_cost_is_a_finite_deficit(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Scenario D").await;
    let member_id = common::create_member(&pool, "Bob", "bob@example.com", 5000.0).await;
    let task_id = common::create_task(&pool, OWNER, project_id, 10.0).await;
    common::record_hours(&pool, task_id, member_id, "2024-04-01", 10.0).await;

    let json = set_revenue(&pool, project_id, json!({ "revenue": 0 })).await;
    let data = &json["data"];
    assert_eq!(data["total_cost"], 50000.0);
    assert_eq!(data["profit"], -50000.0);
    assert_eq!(data["profit_rate"], 0.0);
    assert_eq!(data["is_deficit"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reads_follow_the_ledger_and_are_idempotent(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Live").await;
    let member_id = common::create_member(&pool, "Alice", "alice@example.com", 3000.0).await;
    let task_id = common::create_task(&pool, OWNER, project_id, 10.0).await;
    set_revenue(&pool, project_id, json!({ "revenue": 30000 })).await;

    let entry_id = common::record_hours(&pool, task_id, member_id, "2024-04-01", 4.0).await;
    let first = budget(&pool, project_id).await;
    assert_eq!(first["data"]["total_cost"], 12000.0);
    assert_eq!(first["data"]["profit"], 18000.0);

    let second = budget(&pool, project_id).await;
    assert_eq!(first, second);

    delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/time-entries/{entry_id}"),
        OWNER,
    )
    .await;
    let after = budget(&pool, project_id).await;
    assert_eq!(after["data"]["total_cost"], 0.0);
    assert_eq!(after["data"]["revenue"], 30000.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn currency_is_validated_and_kept(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Currency").await;

    let json = set_revenue(&pool, project_id, json!({ "revenue": 100, "currency": "USD" })).await;
    assert_eq!(json["data"]["currency"], "USD");

    let json = set_revenue(&pool, project_id, json!({ "revenue": 200 })).await;
    assert_eq!(json["data"]["currency"], "USD");

    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/projects/{project_id}/budget/revenue"),
        OWNER,
        json!({ "revenue": -1, "currency": "usd" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["details"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Budget report
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn summary_breaks_cost_down_by_member(pool: PgPool) {
    // A: 5h at 3000, B: 10h at 4000.
    let project_id = common::create_project(&pool, OWNER, "Scenario B").await;
    let alice = common::create_member(&pool, "Alice", "alice@example.com", 3000.0).await;
    let bob = common::create_member(&pool, "Bob", "bob@example.com", 4000.0).await;
    let task_id = common::create_task(&pool, OWNER, project_id, 20.0).await;
    common::record_hours(&pool, task_id, alice, "2024-04-01", 5.0).await;
    common::record_hours(&pool, task_id, bob, "2024-04-01", 10.0).await;
    set_revenue(&pool, project_id, json!({ "revenue": 100000 })).await;

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/projects/{project_id}/budget/summary"),
        OWNER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["project_name"], "Scenario B");
    assert_eq!(data["budget"]["total_cost"], 55000.0);
    assert_eq!(data["cost_breakdown"]["labor_cost"], 55000.0);
    assert_eq!(data["cost_breakdown"]["total_hours"], 15.0);
    let average = data["cost_breakdown"]["average_rate"].as_f64().unwrap();
    assert!((average - 3666.67).abs() < 0.01);

    let members = data["member_costs"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["member_name"], "Alice");
    let alice_share = members[0]["percentage"].as_f64().unwrap();
    let bob_share = members[1]["percentage"].as_f64().unwrap();
    assert!((alice_share - 27.27).abs() < 0.01);
    assert!((bob_share - 72.73).abs() < 0.01);
    assert!(data.get("warning_message").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deficit_summary_carries_warning(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Underwater").await;
    let member_id = common::create_member(&pool, "Alice", "alice@example.com", 5000.0).await;
    let task_id = common::create_task(&pool, OWNER, project_id, 10.0).await;
    common::record_hours(&pool, task_id, member_id, "2024-04-01", 2.0).await;

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/projects/{project_id}/budget/summary"),
        OWNER,
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["data"]["budget"]["is_deficit"], true);
    assert_eq!(
        json["data"]["warning_message"],
        tally_core::summary::DEFICIT_WARNING
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleted_task_stops_counting_toward_cost(pool: PgPool) {
    let project_id = common::create_project(&pool, OWNER, "Pruned").await;
    let member_id = common::create_member(&pool, "Alice", "alice@example.com", 1000.0).await;
    let kept = common::create_task(&pool, OWNER, project_id, 10.0).await;
    let dropped = common::create_task(&pool, OWNER, project_id, 10.0).await;
    common::record_hours(&pool, kept, member_id, "2024-04-01", 1.0).await;
    common::record_hours(&pool, dropped, member_id, "2024-04-01", 3.0).await;

    delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/tasks/{dropped}"),
        OWNER,
    )
    .await;

    let json = budget(&pool, project_id).await;
    assert_eq!(json["data"]["total_cost"], 1000.0);
}
