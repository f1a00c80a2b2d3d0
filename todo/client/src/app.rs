//! Client state: the fetched task snapshot, the view query, which modal is open,
//! and the commands that change them.
use crate::api::{TaskGateway, status_change};
use crate::view::{SortKey, StatusFilter, TaskStats, ViewQuery, derive_view};
use chrono::{DateTime, Utc};
use todo_core::Priority;
use todo_core::task::{DESCRIPTION_MAX_LEN, TITLE_MAX_LEN};
use todo_core::wire::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
use uuid::Uuid;

/// Shortest title the form accepts, after trimming.
pub const TITLE_MIN_LEN: usize = 3;

/// Why the task form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Task title is required")]
    MissingTitle,
    #[error("Task title must be at least 3 characters")]
    TitleTooShort,
    #[error("Task title cannot exceed 100 characters")]
    TitleTooLong,
    #[error("Description cannot exceed 500 characters")]
    DescriptionTooLong,
}

/// Editable values of the create/edit modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`, or empty for no due date.
    pub due_date: String,
    pub priority: Priority,
    /// Carried through an edit unchanged; the form has no control for it.
    pub is_completed: bool,
}

impl TaskForm {
    /// Prefills the form from an existing task.
    pub fn from_task(task: &TaskResponse) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task
                .due_date
                .map(|due| due.date_naive().format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            priority: task.parsed_priority().unwrap_or_default(),
            is_completed: task.is_completed,
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::MissingTitle);
        }
        let length = title.chars().count();
        if length < TITLE_MIN_LEN {
            return Err(FormError::TitleTooShort);
        }
        if length > TITLE_MAX_LEN {
            return Err(FormError::TitleTooLong);
        }
        if self.description.trim().chars().count() > DESCRIPTION_MAX_LEN {
            return Err(FormError::DescriptionTooLong);
        }
        Ok(())
    }

    pub fn to_create_request(&self) -> CreateTaskRequest {
        CreateTaskRequest {
            title: Some(self.title.trim().to_string()),
            description: non_blank(&self.description),
            due_date: non_blank(&self.due_date),
            priority: Some(self.priority.as_str().to_string()),
            is_completed: Some(false),
        }
    }

    pub fn to_update_request(&self) -> UpdateTaskRequest {
        UpdateTaskRequest {
            title: Some(self.title.trim().to_string()),
            description: non_blank(&self.description),
            due_date: non_blank(&self.due_date),
            priority: Some(self.priority.as_str().to_string()),
            is_completed: Some(self.is_completed),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// What the page shows on top of the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    List,
    Creating(TaskForm),
    Editing { id: Uuid, form: TaskForm },
    Viewing(Uuid),
    ConfirmingDelete(Uuid),
}

/// Outcome message shown above the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

impl Banner {
    pub fn message(&self) -> &str {
        match self {
            Banner::Success(message) | Banner::Error(message) => message,
        }
    }
}

pub const LOAD_FAILED: &str = "Failed to load tasks. Please try again.";
pub const SAVE_FAILED: &str = "Failed to save task. Please try again.";
pub const STATUS_FAILED: &str = "Failed to update task status";
pub const DELETE_FAILED: &str = "Failed to delete task";

/// The client application: one task snapshot, replaced wholesale after every
/// mutation, plus the user's view choices.
pub struct TodoApp<G> {
    gateway: G,
    tasks: Vec<TaskResponse>,
    query: ViewQuery,
    view: ViewState,
    banner: Option<Banner>,
}

impl<G: TaskGateway> TodoApp<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            tasks: Vec::new(),
            query: ViewQuery::default(),
            view: ViewState::default(),
            banner: None,
        }
    }

    pub fn tasks(&self) -> &[TaskResponse] {
        &self.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&TaskResponse> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn displayed(&self, now: DateTime<Utc>) -> Vec<&TaskResponse> {
        derive_view(&self.tasks, &self.query, now)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> TaskStats {
        TaskStats::from_tasks(&self.tasks, now)
    }

    pub fn set_filter(&mut self, status: StatusFilter) {
        self.query.status = status;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Replaces the snapshot with the server's list. On failure the stale list stays.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) {
        self.refresh().await;
    }

    async fn refresh(&mut self) {
        match self.gateway.list().await {
            Ok(tasks) => {
                self.tasks = tasks;
                if matches!(self.banner, Some(Banner::Error(_))) {
                    self.banner = None;
                }
            }
            Err(err) => {
                tracing::error!("Loading tasks failed: {}", err);
                self.banner = Some(Banner::Error(LOAD_FAILED.to_string()));
            }
        }
    }

    pub fn open_create(&mut self) {
        self.banner = None;
        self.view = ViewState::Creating(TaskForm::default());
    }

    /// Opens the edit form for a task in the snapshot. Returns false if there is none.
    pub fn open_edit(&mut self, id: Uuid) -> bool {
        let Some(form) = self.task(id).map(TaskForm::from_task) else {
            return false;
        };
        self.banner = None;
        self.view = ViewState::Editing { id, form };
        true
    }

    pub fn open_details(&mut self, id: Uuid) -> bool {
        if self.task(id).is_none() {
            return false;
        }
        self.view = ViewState::Viewing(id);
        true
    }

    /// Asks for confirmation before deleting.
    pub fn request_delete(&mut self, id: Uuid) -> bool {
        if self.task(id).is_none() {
            return false;
        }
        self.view = ViewState::ConfirmingDelete(id);
        true
    }

    /// Closes whatever modal is open.
    pub fn close(&mut self) {
        self.view = ViewState::List;
    }

    /// The open create/edit form, if any.
    pub fn form_mut(&mut self) -> Option<&mut TaskForm> {
        match &mut self.view {
            ViewState::Creating(form) | ViewState::Editing { form, .. } => Some(form),
            _ => None,
        }
    }

    /// Validates and saves the open form, then refetches. The form stays open on failure.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&mut self) {
        let (id, form) = match &self.view {
            ViewState::Creating(form) => (None, form.clone()),
            ViewState::Editing { id, form } => (Some(*id), form.clone()),
            _ => return,
        };
        if let Err(err) = form.validate() {
            self.banner = Some(Banner::Error(err.to_string()));
            return;
        }

        let saved = match id {
            Some(id) => self
                .gateway
                .update(id, &form.to_update_request())
                .await
                .map(|_| "Task updated successfully!"),
            None => self
                .gateway
                .create(&form.to_create_request())
                .await
                .map(|_| "Task created successfully!"),
        };
        match saved {
            Ok(message) => {
                self.view = ViewState::List;
                self.banner = Some(Banner::Success(message.to_string()));
                self.refresh().await;
            }
            Err(err) => {
                tracing::error!("Saving task failed: {}", err);
                self.banner = Some(Banner::Error(SAVE_FAILED.to_string()));
            }
        }
    }

    /// Flips the completion flag of a task with a full-replace update, then refetches.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_status(&mut self, id: Uuid) {
        let Some(task) = self.task(id) else {
            return;
        };
        let request = status_change(task, !task.is_completed);
        let message = if task.is_completed {
            "Task marked as incomplete"
        } else {
            "Task marked as complete"
        };

        self.banner = None;
        match self.gateway.update(id, &request).await {
            Ok(_) => {
                self.banner = Some(Banner::Success(message.to_string()));
                self.refresh().await;
            }
            Err(err) => {
                tracing::error!("Updating task status failed: {}", err);
                self.banner = Some(Banner::Error(STATUS_FAILED.to_string()));
            }
        }
    }

    /// Deletes the task awaiting confirmation, then refetches.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_delete(&mut self) {
        let ViewState::ConfirmingDelete(id) = self.view else {
            return;
        };
        self.view = ViewState::List;
        self.banner = None;
        match self.gateway.delete(id).await {
            Ok(()) => {
                self.banner = Some(Banner::Success("Task deleted successfully!".to_string()));
                self.refresh().await;
            }
            Err(err) => {
                tracing::error!("Deleting task {} failed: {}", id, err);
                self.banner = Some(Banner::Error(DELETE_FAILED.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ClientError, MockTaskGateway};
    use chrono::{Duration, TimeZone};
    use mockall::Sequence;
    use reqwest::StatusCode;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn task(title: &str) -> TaskResponse {
        TaskResponse {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            priority: "medium".to_string(),
            is_completed: false,
            created_at: now() - Duration::days(1),
            updated_at: None,
            due_date: None,
        }
    }

    fn server_error() -> ClientError {
        ClientError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Error retrieving todos".to_string(),
        }
    }

    /// An app whose only list call returns `tasks`.
    async fn loaded_app(
        mut gateway: MockTaskGateway,
        tasks: Vec<TaskResponse>,
    ) -> TodoApp<MockTaskGateway> {
        gateway
            .expect_list()
            .times(1)
            .returning(move || Ok(tasks.clone()));
        let mut app = TodoApp::new(gateway);
        app.load().await;
        app
    }

    #[tokio::test]
    async fn can_load_tasks() {
        let tasks = vec![task("Buy milk"), task("Walk dog")];
        let app = loaded_app(MockTaskGateway::new(), tasks.clone()).await;

        assert_eq!(app.tasks(), tasks.as_slice());
        assert_eq!(app.banner(), None);
    }

    #[tokio::test]
    async fn keeps_stale_list_when_reload_fails() {
        let first = vec![task("Buy milk")];
        let mut gateway = MockTaskGateway::new();
        let mut seq = Sequence::new();
        let snapshot = first.clone();
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(snapshot.clone()));
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(server_error()));
        let mut app = TodoApp::new(gateway);

        app.load().await;
        app.load().await;

        assert_eq!(app.tasks(), first.as_slice());
        assert_eq!(app.banner(), Some(&Banner::Error(LOAD_FAILED.to_string())));
    }

    #[tokio::test]
    async fn can_create_task_and_refetch() {
        let created = task("Buy milk");
        let mut gateway = MockTaskGateway::new();
        let response = created.clone();
        gateway
            .expect_create()
            .withf(|request| {
                request.title.as_deref() == Some("Buy milk")
                    && request.priority.as_deref() == Some("high")
                    && request.description.is_none()
                    && request.due_date.as_deref() == Some("2025-07-01")
                    && request.is_completed == Some(false)
            })
            .times(1)
            .returning(move |_| Ok(response.clone()));
        let listed = vec![created.clone()];
        gateway
            .expect_list()
            .times(1)
            .returning(move || Ok(listed.clone()));
        let mut app = TodoApp::new(gateway);

        app.open_create();
        let form = app.form_mut().unwrap();
        form.title = "  Buy milk ".to_string();
        form.description = "   ".to_string();
        form.due_date = "2025-07-01".to_string();
        form.priority = Priority::High;
        app.submit().await;

        assert_eq!(app.view(), &ViewState::List);
        assert_eq!(
            app.banner(),
            Some(&Banner::Success("Task created successfully!".to_string()))
        );
        assert_eq!(app.tasks(), [created].as_slice());
    }

    #[tokio::test]
    async fn keeps_form_open_when_validation_fails() {
        // No expectations: any gateway call would panic.
        let mut app = TodoApp::new(MockTaskGateway::new());

        app.open_create();
        app.form_mut().unwrap().title = " ab ".to_string();
        app.submit().await;

        assert!(matches!(app.view(), ViewState::Creating(_)));
        assert_eq!(
            app.banner(),
            Some(&Banner::Error(
                "Task title must be at least 3 characters".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn keeps_form_open_when_save_fails() {
        let mut gateway = MockTaskGateway::new();
        gateway.expect_create().returning(|_| Err(server_error()));
        let mut app = TodoApp::new(gateway);

        app.open_create();
        app.form_mut().unwrap().title = "Buy milk".to_string();
        app.submit().await;

        assert!(matches!(app.view(), ViewState::Creating(_)));
        assert_eq!(app.banner(), Some(&Banner::Error(SAVE_FAILED.to_string())));
    }

    #[tokio::test]
    async fn can_edit_task_keeping_its_status() {
        let mut existing = task("Draft");
        existing.is_completed = true;
        existing.due_date = Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
        let id = existing.id;

        let mut gateway = MockTaskGateway::new();
        let mut seq = Sequence::new();
        let first = vec![existing.clone()];
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(first.clone()));
        let updated = existing.clone();
        gateway
            .expect_update()
            .withf(move |update_id, request| {
                *update_id == id
                    && request.title.as_deref() == Some("Final")
                    && request.due_date.as_deref() == Some("2025-07-01")
                    && request.is_completed == Some(true)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(updated.clone()));
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Vec::new()));
        let mut app = TodoApp::new(gateway);
        app.load().await;

        assert!(app.open_edit(id));
        app.form_mut().unwrap().title = "Final".to_string();
        app.submit().await;

        assert_eq!(
            app.banner(),
            Some(&Banner::Success("Task updated successfully!".to_string()))
        );
        assert_eq!(app.view(), &ViewState::List);
    }

    #[tokio::test]
    async fn can_toggle_status() {
        let open = task("Laundry");
        let id = open.id;
        let mut done = open.clone();
        done.is_completed = true;

        let mut gateway = MockTaskGateway::new();
        let mut seq = Sequence::new();
        let first = vec![open.clone()];
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(first.clone()));
        let response = done.clone();
        gateway
            .expect_update()
            .withf(move |update_id, request| {
                *update_id == id
                    && request.is_completed == Some(true)
                    && request.title.as_deref() == Some("Laundry")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(response.clone()));
        let second = vec![done.clone()];
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(second.clone()));
        let mut app = TodoApp::new(gateway);
        app.load().await;

        app.toggle_status(id).await;

        assert_eq!(
            app.banner(),
            Some(&Banner::Success("Task marked as complete".to_string()))
        );
        assert!(app.task(id).unwrap().is_completed);
    }

    #[tokio::test]
    async fn reports_failed_status_change() {
        let mut gateway = MockTaskGateway::new();
        gateway
            .expect_update()
            .returning(|_, _| Err(server_error()));
        let open = task("Laundry");
        let id = open.id;
        let mut app = loaded_app(gateway, vec![open]).await;

        app.toggle_status(id).await;

        assert_eq!(app.banner(), Some(&Banner::Error(STATUS_FAILED.to_string())));
        assert!(!app.task(id).unwrap().is_completed);
    }

    #[tokio::test]
    async fn deletes_only_after_confirmation() {
        let doomed = task("Old");
        let id = doomed.id;
        let mut gateway = MockTaskGateway::new();
        let mut seq = Sequence::new();
        let first = vec![doomed.clone()];
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(first.clone()));
        gateway
            .expect_delete()
            .withf(move |delete_id| *delete_id == id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        gateway
            .expect_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Vec::new()));
        let mut app = TodoApp::new(gateway);
        app.load().await;

        assert!(app.request_delete(id));
        assert_eq!(app.view(), &ViewState::ConfirmingDelete(id));
        app.confirm_delete().await;

        assert!(app.tasks().is_empty());
        assert_eq!(
            app.banner(),
            Some(&Banner::Success("Task deleted successfully!".to_string()))
        );
    }

    #[tokio::test]
    async fn cancelling_delete_keeps_task() {
        let kept = task("Keep");
        let id = kept.id;
        let mut app = loaded_app(MockTaskGateway::new(), vec![kept]).await;

        app.request_delete(id);
        app.close();
        app.confirm_delete().await;

        assert_eq!(app.tasks().len(), 1);
        assert_eq!(app.view(), &ViewState::List);
    }

    #[tokio::test]
    async fn reports_failed_delete() {
        let mut gateway = MockTaskGateway::new();
        gateway.expect_delete().returning(|_| Err(server_error()));
        let kept = task("Keep");
        let id = kept.id;
        let mut app = loaded_app(gateway, vec![kept]).await;

        app.request_delete(id);
        app.confirm_delete().await;

        assert_eq!(app.banner(), Some(&Banner::Error(DELETE_FAILED.to_string())));
        assert_eq!(app.tasks().len(), 1);
    }

    #[tokio::test]
    async fn cannot_open_unknown_task() {
        let mut app = TodoApp::new(MockTaskGateway::new());

        assert!(!app.open_edit(Uuid::new_v4()));
        assert!(!app.open_details(Uuid::new_v4()));
        assert_eq!(app.view(), &ViewState::List);
    }

    #[tokio::test]
    async fn derives_view_from_query() {
        let mut done = task("Done");
        done.is_completed = true;
        let tasks = vec![task("Open"), done];
        let mut app = loaded_app(MockTaskGateway::new(), tasks).await;

        app.set_filter(StatusFilter::Completed);
        let shown: Vec<&str> = app
            .displayed(now())
            .iter()
            .map(|task| task.title.as_str())
            .collect();

        assert_eq!(shown, vec!["Done"]);
        assert_eq!(app.stats(now()).total, 2);
    }

    #[test]
    fn validates_form_limits() {
        let form = |title: &str, description: &str| TaskForm {
            title: title.to_string(),
            description: description.to_string(),
            ..TaskForm::default()
        };

        assert_eq!(form("   ", "").validate(), Err(FormError::MissingTitle));
        assert_eq!(form("ab", "").validate(), Err(FormError::TitleTooShort));
        assert_eq!(
            form(&"a".repeat(101), "").validate(),
            Err(FormError::TitleTooLong)
        );
        assert_eq!(
            form("Fine", &"d".repeat(501)).validate(),
            Err(FormError::DescriptionTooLong)
        );
        assert_eq!(form("abc", &"d".repeat(500)).validate(), Ok(()));
    }

    #[test]
    fn prefills_form_from_task() {
        let mut existing = task("Report");
        existing.description = Some("Numbers".to_string());
        existing.priority = "low".to_string();
        existing.due_date = Some(Utc.with_ymd_and_hms(2025, 7, 1, 15, 0, 0).unwrap());

        let form = TaskForm::from_task(&existing);

        assert_eq!(form.title, "Report");
        assert_eq!(form.description, "Numbers");
        assert_eq!(form.priority, Priority::Low);
        assert_eq!(form.due_date, "2025-07-01");
        assert!(!form.is_completed);
    }
}
