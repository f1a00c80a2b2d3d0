//! JSON API for tasks, mounted under `/api/todos`.
use crate::task::{RepositoryError, TaskRepository};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use todo_core::wire::{
    CreateTaskRequest, ErrorResponse, TaskResponse, UpdateTaskRequest, ValidationErrors,
};
use todo_core::{Task, TaskError};
use utoipa::OpenApi;
use uuid::Uuid;

/// Base path of the task API.
pub const TODOS_PATH: &str = "/api/todos";

/// Shared state for the task handlers.
#[derive(Clone)]
pub struct TaskState {
    pub repository: Arc<dyn TaskRepository>,
}

impl TaskState {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

/// Custom error type for task handler operations.
///
/// Input and not-found errors echo their message to the caller. Anything else is
/// reported with a generic message and logged in full.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The path id is not a UUID, or is the nil UUID.
    #[error("Invalid ID format")]
    InvalidId,
    /// The body could not be parsed as JSON of the expected shape.
    #[error("{0}")]
    MalformedBody(String),
    /// One or more fields failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    /// The domain refused the values.
    #[error("{0}")]
    InvalidTask(#[from] TaskError),
    /// No task has the requested id.
    #[error("Todo with ID {0} not found")]
    NotFound(Uuid),
    /// Storage or other unexpected failure.
    #[error("{context}")]
    Unexpected {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl ApiError {
    /// Maps a repository failure, keeping not-found and input errors distinct from
    /// generic failures. `context` is the message shown to the caller for the latter.
    fn from_repository(context: &'static str) -> impl FnOnce(RepositoryError) -> ApiError {
        move |err| match err {
            RepositoryError::NotFound(id) => ApiError::NotFound(id),
            RepositoryError::EmptyId => ApiError::InvalidId,
            source => ApiError::Unexpected { context, source },
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidId
            | ApiError::MalformedBody(_)
            | ApiError::Validation(_)
            | ApiError::InvalidTask(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        match &self {
            ApiError::Unexpected { context, source } => {
                tracing::error!("{}: {}", context, source);
            }
            other => tracing::warn!("Rejected request: {}", other),
        }
        (status_code, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .ok()
        .filter(|id| !id.is_nil())
        .ok_or(ApiError::InvalidId)
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))
}

/// Handler for GET /api/todos - Returns every task, newest first.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/todos",
    responses(
        (status = 200, description = "All tasks, newest first", body = [TaskResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state
        .repository
        .list_all()
        .await
        .map_err(ApiError::from_repository("Error retrieving todos"))?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// Handler for GET /api/todos/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    params(("id" = String, Path, description = "Task identifier (UUID)")),
    responses(
        (status = 200, description = "The task", body = TaskResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No task with this id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_id(&id)?;
    let task = state
        .repository
        .get_by_id(id)
        .await
        .map_err(ApiError::from_repository("Error retrieving todo"))?
        .ok_or(ApiError::NotFound(id))?;
    Ok(Json(TaskResponse::from(task)))
}

/// Handler for POST /api/todos - Creates a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse,
            headers(("Location" = String, description = "URL of the new task"))),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = parse_body(payload)?.validate()?;
    let task = Task::new(fields)?;
    state
        .repository
        .add(&task)
        .await
        .map_err(ApiError::from_repository("Error creating todo"))?;

    tracing::info!("Created todo {}", task.id());
    let location = format!("{}/{}", TODOS_PATH, task.id());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TaskResponse::from(task)),
    ))
}

/// Handler for PUT /api/todos/{id} - Replaces every field of a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    params(("id" = String, Path, description = "Task identifier (UUID)")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Malformed id or invalid payload", body = ErrorResponse),
        (status = 404, description = "No task with this id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_id(&id)?;
    let fields = parse_body(payload)?.validate()?;

    let mut task = state
        .repository
        .get_by_id(id)
        .await
        .map_err(ApiError::from_repository("Error updating todo"))?
        .ok_or(ApiError::NotFound(id))?;
    task.update(fields, todo_core::task::now())?;
    state
        .repository
        .update(&task)
        .await
        .map_err(ApiError::from_repository("Error updating todo"))?;

    Ok(Json(TaskResponse::from(task)))
}

/// Handler for DELETE /api/todos/{id} - Removes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    params(("id" = String, Path, description = "Task identifier (UUID)")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No task with this id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let context = "Error deleting todo";
    state
        .repository
        .get_by_id(id)
        .await
        .map_err(ApiError::from_repository(context))?
        .ok_or(ApiError::NotFound(id))?;
    state
        .repository
        .delete(id)
        .await
        .map_err(ApiError::from_repository(context))?;

    tracing::info!("Deleted todo {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// OpenAPI description of the task API.
#[derive(OpenApi)]
#[openapi(
    paths(
        list_tasks_handler,
        get_task_handler,
        create_task_handler,
        update_task_handler,
        delete_task_handler
    ),
    components(schemas(TaskResponse, CreateTaskRequest, UpdateTaskRequest, ErrorResponse)),
    tags((name = "Todos", description = "Task management"))
)]
pub struct ApiDoc;

/// Creates and returns the task API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route(
            TODOS_PATH,
            get(list_tasks_handler).post(create_task_handler),
        )
        .route(
            "/api/todos/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
