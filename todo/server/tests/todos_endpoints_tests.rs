use axum::Router;
use axum::http::{Method, StatusCode, header};
use insta::assert_yaml_snapshot;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use todo_core::wire::TaskResponse;
use todo_server::config::Config;
use todo_server::web::create_app;
use uuid::Uuid;

mod common;

use common::{ErrorSnapshot, TestResponse, send};

async fn setup() -> anyhow::Result<Router> {
    let db = common::setup_db().await?;
    Ok(create_app(Arc::new(db), &Config::default())?)
}

fn task_of(response: &TestResponse) -> TaskResponse {
    serde_json::from_value(response.body.clone()).unwrap()
}

async fn create(app: &Router, body: Value) -> TaskResponse {
    let response = send(app, Method::POST, "/api/todos", Some(body)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    task_of(&response)
}

async fn list(app: &Router) -> Vec<TaskResponse> {
    let response = send(app, Method::GET, "/api/todos", None).await;
    assert_eq!(response.status, StatusCode::OK);
    serde_json::from_value(response.body).unwrap()
}

#[tokio::test]
async fn can_walk_through_task_lifecycle() -> anyhow::Result<()> {
    let app = setup().await?;

    let created = create(
        &app,
        json!({"title": "Buy milk", "priority": "high", "dueDate": "2030-01-01"}),
    )
    .await;
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.priority, "high");
    assert!(!created.is_completed);
    assert_eq!(created.updated_at, None);
    assert_eq!(
        created.due_date.map(|due| due.to_rfc3339()),
        Some("2030-01-01T00:00:00+00:00".to_string())
    );

    let uri = format!("/api/todos/{}", created.id);
    let updated = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({
            "title": "Buy milk",
            "priority": "high",
            "dueDate": "2030-01-01",
            "isCompleted": true
        })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    let updated = task_of(&updated);
    assert!(updated.is_completed);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at.is_some_and(|at| at >= created.created_at));

    let deleted = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(deleted.body, Value::Null);

    let gone = send(&app, Method::GET, &uri, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(
        gone.message(),
        format!("Todo with ID {} not found", created.id)
    );
    assert!(list(&app).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn can_list_tasks_newest_first() -> anyhow::Result<()> {
    let app = setup().await?;
    for title in ["First", "Second", "Third"] {
        create(&app, json!({"title": title})).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let titles: Vec<String> = list(&app).await.into_iter().map(|t| t.title).collect();

    assert_eq!(titles, vec!["Third", "Second", "First"]);
    Ok(())
}

#[tokio::test]
async fn can_get_exactly_what_was_created() -> anyhow::Result<()> {
    let app = setup().await?;
    let response = send(
        &app,
        Method::POST,
        "/api/todos",
        Some(json!({
            "title": "Write report",
            "description": "Quarterly numbers",
            "dueDate": "2030-06-30T15:30:00Z",
            "priority": "low"
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let created = task_of(&response);

    let location = response.headers[header::LOCATION].to_str()?;
    assert_eq!(location, format!("/api/todos/{}", created.id));

    let fetched = send(&app, Method::GET, location, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(task_of(&fetched), created);
    Ok(())
}

#[tokio::test]
async fn can_create_with_defaults() -> anyhow::Result<()> {
    let app = setup().await?;

    let created = create(&app, json!({"title": "x"})).await;

    assert_eq!(created.title, "x");
    assert_eq!(created.priority, "medium");
    assert_eq!(created.description, None);
    assert_eq!(created.due_date, None);
    assert!(!created.is_completed);
    Ok(())
}

#[tokio::test]
async fn keeps_completion_flag_supplied_on_create() -> anyhow::Result<()> {
    let app = setup().await?;

    let created = create(&app, json!({"title": "Already done", "isCompleted": true})).await;

    assert!(created.is_completed);
    Ok(())
}

#[tokio::test]
async fn rejects_malformed_id() -> anyhow::Result<()> {
    let app = setup().await?;

    let response = send(&app, Method::GET, "/api/todos/not-a-uuid", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_yaml_snapshot!(ErrorSnapshot::from(&response));
    Ok(())
}

#[tokio::test]
async fn rejects_blank_title_without_storing_anything() -> anyhow::Result<()> {
    let app = setup().await?;

    let response = send(&app, Method::POST, "/api/todos", Some(json!({"title": "   "}))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_yaml_snapshot!(ErrorSnapshot::from(&response));
    assert!(list(&app).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn rejects_overlong_title() -> anyhow::Result<()> {
    let app = setup().await?;

    let response = send(
        &app,
        Method::POST,
        "/api/todos",
        Some(json!({"title": "a".repeat(101)})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Title cannot exceed 100 characters");
    Ok(())
}

#[tokio::test]
async fn rejects_unknown_priority() -> anyhow::Result<()> {
    let app = setup().await?;

    let response = send(
        &app,
        Method::POST,
        "/api/todos",
        Some(json!({"title": "Call mom", "priority": "urgent"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        "Priority must be 'low', 'medium', or 'high'"
    );
    assert!(list(&app).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn rejects_malformed_json() -> anyhow::Result<()> {
    let app = setup().await?;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/todos")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"title\": "))?;
    let response = tower::ServiceExt::oneshot(app.clone(), request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(list(&app).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_of_unknown_task_creates_nothing() -> anyhow::Result<()> {
    let app = setup().await?;
    let id = Uuid::new_v4();

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/todos/{id}"),
        Some(json!({"title": "Ghost", "isCompleted": false})),
    )
    .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), format!("Todo with ID {id} not found"));
    assert!(list(&app).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_requires_completion_flag() -> anyhow::Result<()> {
    let app = setup().await?;
    let created = create(&app, json!({"title": "Laundry"})).await;

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/todos/{}", created.id),
        Some(json!({"title": "Laundry"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "isCompleted is required");
    Ok(())
}

#[tokio::test]
async fn update_replaces_every_field() -> anyhow::Result<()> {
    let app = setup().await?;
    let created = create(
        &app,
        json!({
            "title": "Draft",
            "description": "Rough notes",
            "dueDate": "2030-01-01",
            "priority": "high"
        }),
    )
    .await;

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/todos/{}", created.id),
        Some(json!({"title": "Final", "isCompleted": false})),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let updated = task_of(&response);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description, None);
    assert_eq!(updated.due_date, None);
    assert_eq!(updated.priority, "medium");
    Ok(())
}

#[tokio::test]
async fn keeps_update_stamp_moving_forward() -> anyhow::Result<()> {
    let app = setup().await?;
    let created = create(&app, json!({"title": "Toggle me"})).await;
    let uri = format!("/api/todos/{}", created.id);

    let first = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"title": "Toggle me", "isCompleted": true})),
    )
    .await;
    let second = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"title": "Toggle me", "isCompleted": false})),
    )
    .await;

    let first = task_of(&first).updated_at.unwrap();
    let second = task_of(&second).updated_at.unwrap();
    assert!(second >= first);
    Ok(())
}

#[tokio::test]
async fn delete_of_unknown_task_is_not_found() -> anyhow::Result<()> {
    let app = setup().await?;
    let id = Uuid::new_v4();

    let response = send(&app, Method::DELETE, &format!("/api/todos/{id}"), None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), format!("Todo with ID {id} not found"));
    Ok(())
}

#[tokio::test]
async fn delete_rejects_malformed_id() -> anyhow::Result<()> {
    let app = setup().await?;

    let response = send(&app, Method::DELETE, "/api/todos/12345", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid ID format");
    Ok(())
}
