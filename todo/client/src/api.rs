//! HTTP data layer: one call per API operation, returning the plain wire shapes.
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use todo_core::wire::{CreateTaskRequest, ErrorResponse, TaskResponse, UpdateTaskRequest};
use uuid::Uuid;

const TODOS_PATH: &str = "/api/todos";

/// Error type for calls to the task API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("Server responded {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(err) => err.status(),
            ClientError::Api { status, .. } => Some(*status),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// The task API as seen by the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<TaskResponse>, ClientError>;

    async fn get(&self, id: Uuid) -> Result<TaskResponse, ClientError>;

    async fn create(&self, request: &CreateTaskRequest) -> Result<TaskResponse, ClientError>;

    /// Replaces every field of the task.
    async fn update(
        &self,
        id: Uuid,
        request: &UpdateTaskRequest,
    ) -> Result<TaskResponse, ClientError>;

    async fn delete(&self, id: Uuid) -> Result<(), ClientError>;
}

/// [`TaskGateway`] talking to a running server over HTTP.
#[derive(Debug, Clone)]
pub struct TodoApi {
    client: Client,
    base_url: String,
}

impl TodoApi {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, TODOS_PATH)
    }

    fn task_url(&self, id: Uuid) -> String {
        format!("{}{}/{}", self.base_url, TODOS_PATH, id)
    }
}

/// Turns a non-success response into [`ClientError::Api`], keeping the server's message.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    };
    Err(ClientError::Api { status, message })
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(check(response).await?.json::<T>().await?)
}

#[async_trait]
impl TaskGateway for TodoApi {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<TaskResponse>, ClientError> {
        let response = self.client.get(self.collection_url()).send().await?;
        read(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<TaskResponse, ClientError> {
        let response = self.client.get(self.task_url(id)).send().await?;
        read(response).await
    }

    #[tracing::instrument(skip(self, request))]
    async fn create(&self, request: &CreateTaskRequest) -> Result<TaskResponse, ClientError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(request)
            .send()
            .await?;
        read(response).await
    }

    #[tracing::instrument(skip(self, request))]
    async fn update(
        &self,
        id: Uuid,
        request: &UpdateTaskRequest,
    ) -> Result<TaskResponse, ClientError> {
        let response = self
            .client
            .put(self.task_url(id))
            .json(request)
            .send()
            .await?;
        read(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self.client.delete(self.task_url(id)).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Full-replace payload that keeps every field of `task` and sets only the completion flag.
pub fn status_change(task: &TaskResponse, is_completed: bool) -> UpdateTaskRequest {
    UpdateTaskRequest {
        title: Some(task.title.clone()),
        description: task.description.clone(),
        due_date: task.due_date.map(|due| due.to_rfc3339()),
        priority: Some(task.priority.clone()),
        is_completed: Some(is_completed),
    }
}
