//! Browser front end: serves the rendered page and turns form posts into
//! [`TodoApp`] commands.
//!
//! Every command redirects back to `/`, which renders the current state. The
//! app sits behind a mutex held for the whole command, so a page requested
//! while a command is still waiting on the API gets the loading page instead.
use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use todo_core::Priority;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api::TaskGateway;
use crate::app::{TodoApp, ViewState};
use crate::render::render_page;
use crate::view::ViewError;

/// Custom error type for page handlers.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    #[error(transparent)]
    InvalidQuery(#[from] ViewError),
    #[error("Invalid task form: {0}")]
    InvalidForm(String),
    #[error("Task not found")]
    NotFound,
    #[error("This task is no longer awaiting deletion")]
    NotAwaitingDelete,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = match self {
            WebError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::InvalidQuery(_) | WebError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::NotAwaitingDelete => StatusCode::CONFLICT,
        };
        let message = match &self {
            WebError::Template(err) => {
                tracing::error!("Rendering page failed: {}", err);
                "An unexpected error occurred while rendering the page.".to_string()
            }
            other => other.to_string(),
        };

        let Ok(rendered) = ErrorPageTemplate { message }.render() else {
            return status_code.into_response();
        };
        (status_code, Html(rendered)).into_response()
    }
}

#[derive(Template)]
#[template(path = "loading.html")]
struct LoadingTemplate;

#[derive(Template)]
#[template(path = "error_page.html")]
struct ErrorPageTemplate {
    message: String,
}

/// View choices carried in the page URL, e.g. `/?status=pending&sort=dueDate`.
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    status: Option<String>,
    search: Option<String>,
    sort: Option<String>,
}

impl ViewParams {
    fn apply<G: TaskGateway>(self, app: &mut TodoApp<G>) -> Result<(), ViewError> {
        if let Some(status) = self.status {
            app.set_filter(status.parse()?);
        }
        if let Some(sort) = self.sort {
            app.set_sort(sort.parse()?);
        }
        if let Some(search) = self.search {
            app.set_search(search);
        }
        Ok(())
    }
}

/// Fields posted by the create/edit modal.
#[derive(Debug, Default, Deserialize)]
pub struct TaskFormInput {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "dueDate")]
    due_date: String,
    #[serde(default)]
    priority: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmDeleteInput {
    id: Uuid,
}

pub struct WebState<G> {
    app: Mutex<TodoApp<G>>,
}

type SharedState<G> = State<Arc<WebState<G>>>;

/// Handler for `/`: applies any view choices from the URL and renders the page.
#[tracing::instrument(skip(state))]
async fn page_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
    Query(params): Query<ViewParams>,
) -> Result<Html<String>, WebError> {
    let Ok(mut app) = state.app.try_lock() else {
        return LoadingTemplate.render().map(Html).map_err(WebError::from);
    };
    params.apply(&mut app)?;
    render_page(&app, todo_core::task::now())
        .map(Html)
        .map_err(WebError::from)
}

#[tracing::instrument(skip(state))]
async fn refresh_handler<G: TaskGateway + 'static>(State(state): SharedState<G>) -> Redirect {
    state.app.lock().await.load().await;
    Redirect::to("/")
}

#[tracing::instrument(skip(state))]
async fn dismiss_banner_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
) -> Redirect {
    state.app.lock().await.dismiss_banner();
    Redirect::to("/")
}

#[tracing::instrument(skip(state))]
async fn close_handler<G: TaskGateway + 'static>(State(state): SharedState<G>) -> Redirect {
    state.app.lock().await.close();
    Redirect::to("/")
}

#[tracing::instrument(skip(state))]
async fn new_task_handler<G: TaskGateway + 'static>(State(state): SharedState<G>) -> Redirect {
    state.app.lock().await.open_create();
    Redirect::to("/")
}

#[tracing::instrument(skip(state))]
async fn view_task_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, WebError> {
    if !state.app.lock().await.open_details(id) {
        return Err(WebError::NotFound);
    }
    Ok(Redirect::to("/"))
}

#[tracing::instrument(skip(state))]
async fn edit_task_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, WebError> {
    if !state.app.lock().await.open_edit(id) {
        return Err(WebError::NotFound);
    }
    Ok(Redirect::to("/"))
}

#[tracing::instrument(skip(state))]
async fn delete_task_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, WebError> {
    if !state.app.lock().await.request_delete(id) {
        return Err(WebError::NotFound);
    }
    Ok(Redirect::to("/"))
}

#[tracing::instrument(skip(state))]
async fn confirm_delete_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
    Form(input): Form<ConfirmDeleteInput>,
) -> Result<Redirect, WebError> {
    let mut app = state.app.lock().await;
    // A stale page must not delete whatever is pending now.
    if app.view() != &ViewState::ConfirmingDelete(input.id) {
        return Err(WebError::NotAwaitingDelete);
    }
    app.confirm_delete().await;
    Ok(Redirect::to("/"))
}

#[tracing::instrument(skip(state))]
async fn toggle_task_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, WebError> {
    let mut app = state.app.lock().await;
    if app.task(id).is_none() {
        return Err(WebError::NotFound);
    }
    app.toggle_status(id).await;
    Ok(Redirect::to("/"))
}

/// Handler for the create/edit modal. Validation failures keep the modal open with the message.
#[tracing::instrument(skip(state, input))]
async fn save_task_handler<G: TaskGateway + 'static>(
    State(state): SharedState<G>,
    Form(input): Form<TaskFormInput>,
) -> Result<Redirect, WebError> {
    let priority = if input.priority.is_empty() {
        Priority::default()
    } else {
        input
            .priority
            .parse()
            .map_err(|err: todo_core::task::TaskError| WebError::InvalidForm(err.to_string()))?
    };

    let mut app = state.app.lock().await;
    let Some(form) = app.form_mut() else {
        tracing::warn!("Task form posted with no form open");
        return Ok(Redirect::to("/"));
    };
    form.title = input.title;
    form.description = input.description;
    form.due_date = input.due_date;
    form.priority = priority;
    app.submit().await;
    Ok(Redirect::to("/"))
}

/// Creates the page router around an app whose snapshot has usually been loaded already.
pub fn create_web_router<G: TaskGateway + 'static>(app: TodoApp<G>) -> Router {
    let state = Arc::new(WebState {
        app: Mutex::new(app),
    });
    Router::new()
        .route("/", get(page_handler::<G>))
        .route("/refresh", post(refresh_handler::<G>))
        .route("/banner/dismiss", post(dismiss_banner_handler::<G>))
        .route("/close", post(close_handler::<G>))
        .route("/tasks/new", post(new_task_handler::<G>))
        .route("/tasks/save", post(save_task_handler::<G>))
        .route("/tasks/delete", post(confirm_delete_handler::<G>))
        .route("/tasks/{id}/view", post(view_task_handler::<G>))
        .route("/tasks/{id}/edit", post(edit_task_handler::<G>))
        .route("/tasks/{id}/delete", post(delete_task_handler::<G>))
        .route("/tasks/{id}/toggle", post(toggle_task_handler::<G>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the page router on an already bound listener until the server stops.
pub async fn serve<G: TaskGateway + 'static>(
    listener: tokio::net::TcpListener,
    app: TodoApp<G>,
) -> anyhow::Result<()> {
    axum::serve(listener, create_web_router(app)).await?;
    Ok(())
}
