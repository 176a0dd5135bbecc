//! Integration tests for the budget ledger.
//!
//! Verifies lazy creation, cost refresh from the time ledger, profit
//! arithmetic on persisted rows, idempotent reads, and that concurrent
//! writers never leave a row whose profit disagrees with its cost.

use chrono::NaiveDate;
use sqlx::PgPool;
use tally_db::models::member::NewMember;
use tally_db::models::project::NewProject;
use tally_db::models::task::NewTask;
use tally_core::cost::project_cost_summary;
use tally_db::models::time_entry::NewTimeEntry;
use tally_db::repositories::{BudgetRepo, MemberRepo, ProjectRepo, TaskRepo, TimeEntryRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_project(pool: &PgPool) -> i64 {
    ProjectRepo::create(
        pool,
        1,
        &NewProject {
            name: "Budgeted".to_string(),
            description: None,
            status: Default::default(),
            budget_amount: Some(100000.0),
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_task(pool: &PgPool, project_id: i64, planned_hours: f64) -> i64 {
    TaskRepo::create(
        pool,
        project_id,
        &NewTask {
            name: "Work".to_string(),
            description: None,
            assigned_to: None,
            planned_hours,
            status: Default::default(),
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_member(pool: &PgPool, name: &str, hourly_rate: f64) -> i64 {
    MemberRepo::create(
        pool,
        &NewMember {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            user_id: None,
            role: None,
            hourly_rate,
            department: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn log_hours(pool: &PgPool, task_id: i64, member_id: i64, hours: f64) {
    TimeEntryRepo::record(
        pool,
        1,
        &NewTimeEntry {
            task_id,
            member_id,
            work_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            hours,
            comment: None,
        },
    )
    .await
    .unwrap();
}

async fn budget_rows(pool: &PgPool, project_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM budgets WHERE project_id = $1")
        .bind(project_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn stored_figures(pool: &PgPool, project_id: i64) -> (f64, f64, f64) {
    sqlx::query_as("SELECT revenue, total_cost, profit FROM budgets WHERE project_id = $1")
        .bind(project_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn first_read_creates_zero_budget(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    assert_eq!(budget_rows(&pool, project_id).await, 0);

    let budget = BudgetRepo::get_or_create(&pool, project_id, "JPY").await.unwrap();

    assert_eq!(budget.revenue, 0.0);
    assert_eq!(budget.total_cost, 0.0);
    assert_eq!(budget.profit, 0.0);
    assert_eq!(budget.profit_rate, 0.0);
    assert_eq!(budget.currency, "JPY");
}

#[sqlx::test(migrations = "./migrations")]
async fn revenue_with_logged_cost_yields_profit(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let task_id = seed_task(&pool, project_id, 10.0).await;
    let member_id = seed_member(&pool, "Sato", 5000.0).await;
    log_hours(&pool, task_id, member_id, 8.0).await;

    let budget = BudgetRepo::set_revenue(&pool, project_id, 100000.0, None, "JPY")
        .await
        .unwrap();

    assert_eq!(budget.total_cost, 40000.0);
    assert_eq!(budget.profit, 60000.0);
    assert_eq!(budget.profit_rate, 60.0);

    let (_, stored_cost, stored_profit) = stored_figures(&pool, project_id).await;
    assert_eq!(stored_cost, 40000.0);
    assert_eq!(stored_profit, 60000.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn zero_revenue_with_cost_is_deficit(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let task_id = seed_task(&pool, project_id, 10.0).await;
    let member_id = seed_member(&pool, "Sato", 5000.0).await;
    log_hours(&pool, task_id, member_id, 10.0).await;

    let budget = BudgetRepo::set_revenue(&pool, project_id, 0.0, Some("USD"), "JPY")
        .await
        .unwrap();

    assert_eq!(budget.profit, -50000.0);
    assert_eq!(budget.profit_rate, 0.0);
    assert_eq!(budget.currency, "USD");
    assert!(budget.figures().is_deficit());
}

#[sqlx::test(migrations = "./migrations")]
async fn reads_refresh_cost_after_new_entries(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let task_id = seed_task(&pool, project_id, 20.0).await;
    let alice = seed_member(&pool, "Alice", 3000.0).await;
    let bob = seed_member(&pool, "Bob", 4000.0).await;

    BudgetRepo::set_revenue(&pool, project_id, 100000.0, None, "JPY")
        .await
        .unwrap();
    log_hours(&pool, task_id, alice, 5.0).await;
    log_hours(&pool, task_id, bob, 10.0).await;

    let budget = BudgetRepo::get_or_create(&pool, project_id, "JPY").await.unwrap();
    assert_eq!(budget.total_cost, 55000.0);
    assert_eq!(budget.profit, 45000.0);
    assert_eq!(budget.profit_rate, 45.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn repeated_reads_are_identical(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let task_id = seed_task(&pool, project_id, 10.0).await;
    let member_id = seed_member(&pool, "Sato", 5000.0).await;
    log_hours(&pool, task_id, member_id, 3.0).await;

    let first = BudgetRepo::get_or_create(&pool, project_id, "JPY").await.unwrap();
    let second = BudgetRepo::get_or_create(&pool, project_id, "JPY").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.figures(), second.figures());
    assert_eq!(first.updated_at, second.updated_at);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleted_task_stops_counting_toward_cost(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let kept = seed_task(&pool, project_id, 10.0).await;
    let dropped = seed_task(&pool, project_id, 10.0).await;
    let member_id = seed_member(&pool, "Sato", 1000.0).await;
    log_hours(&pool, kept, member_id, 2.0).await;
    log_hours(&pool, dropped, member_id, 5.0).await;

    TaskRepo::soft_delete(&pool, dropped).await.unwrap();

    let budget = BudgetRepo::get_or_create(&pool, project_id, "JPY").await.unwrap();
    assert_eq!(budget.total_cost, 2000.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn report_facts_match_budget_cost(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let task_id = seed_task(&pool, project_id, 20.0).await;
    let alice = seed_member(&pool, "Alice", 3000.0).await;
    let bob = seed_member(&pool, "Bob", 4000.0).await;
    log_hours(&pool, task_id, alice, 2.5).await;
    log_hours(&pool, task_id, bob, 1.5).await;

    let (budget, facts) = BudgetRepo::report(&pool, project_id, "JPY").await.unwrap();

    assert_eq!(facts.len(), 2);
    assert_eq!(project_cost_summary(&facts).total_cost, budget.total_cost);
    assert_eq!(budget.total_cost, 13500.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_first_reads_create_one_budget(pool: PgPool) {
    let project_id = seed_project(&pool).await;

    let mut readers = tokio::task::JoinSet::new();
    for _ in 0..6 {
        let pool = pool.clone();
        readers.spawn(async move { BudgetRepo::get_or_create(&pool, project_id, "JPY").await });
    }
    let mut ids = Vec::new();
    while let Some(joined) = readers.join_next().await {
        ids.push(joined.unwrap().unwrap().id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(budget_rows(&pool, project_id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_revenue_and_cost_writes_keep_profit_consistent(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let task_id = seed_task(&pool, project_id, 40.0).await;
    let member_id = seed_member(&pool, "Sato", 2000.0).await;
    let revenues = [50000.0, 80000.0, 120000.0];

    let mut writers = tokio::task::JoinSet::new();
    for (i, revenue) in revenues.into_iter().enumerate() {
        let pool = pool.clone();
        writers.spawn(async move {
            let budget = BudgetRepo::set_revenue(&pool, project_id, revenue, None, "JPY")
                .await
                .unwrap();
            assert_eq!(budget.profit, budget.revenue - budget.total_cost);
            log_hours(&pool, task_id, member_id, 1.0 + i as f64).await;
            let budget = BudgetRepo::get_or_create(&pool, project_id, "JPY")
                .await
                .unwrap();
            assert_eq!(budget.profit, budget.revenue - budget.total_cost);
        });
    }
    while let Some(joined) = writers.join_next().await {
        joined.unwrap();
    }

    let (revenue, total_cost, profit) = stored_figures(&pool, project_id).await;
    assert!(revenues.contains(&revenue));
    assert_eq!(profit, revenue - total_cost);

    let budget = BudgetRepo::get_or_create(&pool, project_id, "JPY").await.unwrap();
    assert_eq!(budget.revenue, revenue);
    assert_eq!(budget.total_cost, 12000.0);
    assert_eq!(budget.profit, revenue - 12000.0);
}
