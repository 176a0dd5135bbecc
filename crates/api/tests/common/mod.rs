#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use tally_api::auth::jwt::{generate_access_token, JwtConfig};
use tally_api::config::ServerConfig;
use tally_api::router::build_app_router;
use tally_api::state::AppState;
use tally_core::types::DbId;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        cors_max_age_secs: 600,
        max_body_bytes: 4096,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        default_currency: "JPY".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A valid access token for `user_id`.
pub fn token(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token should encode")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: Option<DbId>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token(user_id)));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::GET, uri, Some(user_id), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(user_id), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(user_id), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(user_id), None).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a project owned by `user_id` through the API, returning its id.
pub async fn create_project(pool: &PgPool, user_id: DbId, name: &str) -> DbId {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/projects",
        user_id,
        serde_json::json!({ "name": name }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a member with the given hourly rate, returning its id.
pub async fn create_member(pool: &PgPool, name: &str, email: &str, rate: f64) -> DbId {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/members",
        1,
        serde_json::json!({ "name": name, "email": email, "hourly_rate": rate }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a task under `project_id`, returning its id.
pub async fn create_task(pool: &PgPool, user_id: DbId, project_id: DbId, planned: f64) -> DbId {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/projects/{project_id}/tasks"),
        user_id,
        serde_json::json!({ "name": "Task", "planned_hours": planned }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Record hours through the API, returning the new entry id.
pub async fn record_hours(
    pool: &PgPool,
    task_id: DbId,
    member_id: DbId,
    work_date: &str,
    hours: f64,
) -> DbId {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/time-entries",
        1,
        serde_json::json!({
            "task_id": task_id,
            "member_id": member_id,
            "work_date": work_date,
            "hours": hours,
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
