use crate::api::TaskGateway;
use crate::app::{Banner, TaskForm, TodoApp, ViewState};
use crate::dates::{days_badge, days_until, due_label, long_timestamp};
use crate::view::{SortKey, StatusFilter, TaskStats, ViewQuery};
use askama::Template;
use chrono::{DateTime, Utc};
use todo_core::Priority;
use todo_core::task::{DESCRIPTION_MAX_LEN, TITLE_MAX_LEN};
use todo_core::wire::TaskResponse;

/// Badge colour for a priority wire value. Unknown values get a neutral grey.
pub fn priority_color(priority: &str) -> &'static str {
    match priority.parse::<Priority>() {
        Ok(Priority::High) => "#dc3545",
        Ok(Priority::Medium) => "#ffc107",
        Ok(Priority::Low) => "#28a745",
        Err(_) => "#6c757d",
    }
}

/// "high" -> "High".
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Everything a task card shows, precomputed for the template.
struct TaskCard {
    id: String,
    title: String,
    description: String,
    priority_label: String,
    priority_color: &'static str,
    is_completed: bool,
    is_overdue: bool,
    due_label: String,
    due_today: bool,
    days_badge: String,
}

impl TaskCard {
    fn new(task: &TaskResponse, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority_label: capitalize(&task.priority),
            priority_color: priority_color(&task.priority),
            is_completed: task.is_completed,
            is_overdue: task.is_overdue(now),
            due_label: task.due_date.map(|due| due_label(due, now)).unwrap_or_default(),
            due_today: task.due_date.is_some_and(|due| days_until(due, now) == 0),
            days_badge: task
                .due_date
                .and_then(|due| days_badge(due, now))
                .unwrap_or_default(),
        }
    }
}

/// One `<option>` of a select control.
struct SelectOption {
    value: &'static str,
    label: String,
    selected: bool,
}

impl SelectOption {
    fn new(value: &'static str, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value,
            label: label.into(),
            selected,
        }
    }
}

fn filter_options(query: &ViewQuery) -> Vec<SelectOption> {
    StatusFilter::ALL
        .iter()
        .map(|filter| {
            SelectOption::new(filter.as_str(), filter.label(), *filter == query.status)
        })
        .collect()
}

fn sort_options(query: &ViewQuery) -> Vec<SelectOption> {
    SortKey::ALL
        .iter()
        .map(|key| SelectOption::new(key.as_str(), key.label(), *key == query.sort))
        .collect()
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate {
    error: String,
    success: String,
    stats: TaskStats,
    search: String,
    filter_options: Vec<SelectOption>,
    sort_options: Vec<SelectOption>,
    section_title: &'static str,
    empty_hint: &'static str,
    cards: Vec<TaskCard>,
    modal: String,
}

#[derive(Template)]
#[template(path = "task_form.html")]
struct TaskFormTemplate {
    heading: &'static str,
    submit_label: &'static str,
    busy_label: &'static str,
    error: String,
    title: String,
    title_length: usize,
    title_max: usize,
    description: String,
    description_length: usize,
    description_max: usize,
    due_date: String,
    priority_options: Vec<SelectOption>,
}

impl TaskFormTemplate {
    fn new(form: &TaskForm, editing: bool, error: String) -> Self {
        let (heading, submit_label, busy_label) = if editing {
            ("Edit Task", "Update Task", "Updating...")
        } else {
            ("Create New Task", "Create Task", "Creating...")
        };
        Self {
            heading,
            submit_label,
            busy_label,
            error,
            title: form.title.clone(),
            title_length: form.title.chars().count(),
            title_max: TITLE_MAX_LEN,
            description: form.description.clone(),
            description_length: form.description.chars().count(),
            description_max: DESCRIPTION_MAX_LEN,
            due_date: form.due_date.clone(),
            priority_options: Priority::ALL
                .iter()
                .map(|priority| {
                    SelectOption::new(
                        priority.as_str(),
                        capitalize(priority.as_str()),
                        *priority == form.priority,
                    )
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "task_detail.html")]
struct TaskDetailTemplate {
    card: TaskCard,
    created: String,
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
struct ConfirmDeleteTemplate {
    id: String,
    title: String,
}

/// Renders the modal for the current view state, or an empty string for the plain list.
fn render_modal<G: TaskGateway>(
    app: &TodoApp<G>,
    now: DateTime<Utc>,
) -> Result<String, askama::Error> {
    let form_error = match app.banner() {
        Some(Banner::Error(message)) => message.clone(),
        _ => String::new(),
    };
    match app.view() {
        ViewState::List => Ok(String::new()),
        ViewState::Creating(form) => {
            TaskFormTemplate::new(form, false, form_error).render()
        }
        ViewState::Editing { form, .. } => {
            TaskFormTemplate::new(form, true, form_error).render()
        }
        ViewState::Viewing(id) => match app.task(*id) {
            Some(task) => TaskDetailTemplate {
                card: TaskCard::new(task, now),
                created: long_timestamp(task.created_at),
            }
            .render(),
            None => Ok(String::new()),
        },
        ViewState::ConfirmingDelete(id) => match app.task(*id) {
            Some(task) => ConfirmDeleteTemplate {
                id: task.id.to_string(),
                title: task.title.clone(),
            }
            .render(),
            None => Ok(String::new()),
        },
    }
}

/// Renders the whole page for the app's current state.
#[tracing::instrument(skip(app))]
pub fn render_page<G: TaskGateway>(
    app: &TodoApp<G>,
    now: DateTime<Utc>,
) -> Result<String, askama::Error> {
    let (error, success) = match app.banner() {
        Some(Banner::Error(message)) => (message.clone(), String::new()),
        Some(Banner::Success(message)) => (String::new(), message.clone()),
        None => (String::new(), String::new()),
    };
    let query = app.query();
    let page = PageTemplate {
        error,
        success,
        stats: app.stats(now),
        search: query.search.clone(),
        filter_options: filter_options(query),
        sort_options: sort_options(query),
        section_title: query.status.section_title(),
        empty_hint: if query.is_searching() {
            "Try a different search term"
        } else {
            "Create a new task to get started"
        },
        cards: app
            .displayed(now)
            .into_iter()
            .map(|task| TaskCard::new(task, now))
            .collect(),
        modal: render_modal(app, now)?,
    };
    page.render()
}
