//! The displayed list is a pure function of the fetched tasks and the view query:
//! status filter, then text search, then a stable sort.
use chrono::{DateTime, Utc};
use icu_collator::{Collator, CollatorOptions};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use todo_core::Priority;
use todo_core::wire::TaskResponse;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("Unknown status filter '{0}'")]
    UnknownFilter(String),
    #[error("Unknown sort key '{0}'")]
    UnknownSortKey(String),
}

/// Which tasks the list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
    /// Open tasks whose due date has passed.
    Overdue,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Completed,
        StatusFilter::Pending,
        StatusFilter::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Pending => "pending",
            StatusFilter::Overdue => "overdue",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Completed => "Completed",
            StatusFilter::Pending => "Pending",
            StatusFilter::Overdue => "Overdue",
        }
    }

    /// Heading shown above the list.
    pub fn section_title(&self) -> &'static str {
        match self {
            StatusFilter::All => "All Tasks",
            StatusFilter::Completed => "Completed Tasks",
            StatusFilter::Pending => "Pending Tasks",
            StatusFilter::Overdue => "Overdue Tasks",
        }
    }

    pub fn matches(&self, task: &TaskResponse, now: DateTime<Utc>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.is_completed,
            StatusFilter::Pending => !task.is_completed,
            StatusFilter::Overdue => task.is_overdue(now),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ViewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == value)
            .ok_or_else(|| ViewError::UnknownFilter(value.to_string()))
    }
}

/// Order of the displayed list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Keep the order the server returned, newest first.
    #[default]
    DateAdded,
    DueDate,
    Priority,
    Title,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::DateAdded,
        SortKey::DueDate,
        SortKey::Priority,
        SortKey::Title,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DateAdded => "dateAdded",
            SortKey::DueDate => "dueDate",
            SortKey::Priority => "priority",
            SortKey::Title => "title",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::DateAdded => "Date Added",
            SortKey::DueDate => "Due Date",
            SortKey::Priority => "Priority",
            SortKey::Title => "Title",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ViewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| ViewError::UnknownSortKey(value.to_string()))
    }
}

/// Everything the user chose that shapes the displayed list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub status: StatusFilter,
    pub search: String,
    pub sort: SortKey,
}

impl ViewQuery {
    /// Whether a non-blank search term is active.
    pub fn is_searching(&self) -> bool {
        !self.search.trim().is_empty()
    }
}

/// Filters, searches and sorts `tasks` for display. `tasks` is left untouched.
pub fn derive_view<'a>(
    tasks: &'a [TaskResponse],
    query: &ViewQuery,
    now: DateTime<Utc>,
) -> Vec<&'a TaskResponse> {
    let term = query.search.trim().to_lowercase();
    let mut shown: Vec<&TaskResponse> = tasks
        .iter()
        .filter(|task| query.status.matches(task, now))
        .filter(|task| term.is_empty() || matches_search(task, &term))
        .collect();

    match query.sort {
        SortKey::DateAdded => {}
        // Undated tasks go last.
        SortKey::DueDate => {
            shown.sort_by_key(|task| (task.due_date.is_none(), task.due_date));
        }
        SortKey::Priority => shown.sort_by_key(|task| priority_rank(task)),
        SortKey::Title => {
            let order = TitleOrder::new();
            shown.sort_by(|a, b| order.compare(&a.title, &b.title));
        }
    }
    shown
}

/// `term` must already be lowercase and non-empty.
fn matches_search(task: &TaskResponse, term: &str) -> bool {
    task.title.to_lowercase().contains(term)
        || task
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(term))
}

/// Unrecognised priorities sort with medium.
fn priority_rank(task: &TaskResponse) -> u8 {
    task.parsed_priority().unwrap_or(Priority::Medium).rank()
}

/// Locale-aware title order using the root collation: base letters first,
/// then accents, then case with lowercase first.
pub struct TitleOrder {
    collator: Option<Collator>,
}

impl TitleOrder {
    pub fn new() -> Self {
        match Collator::try_new(&Default::default(), CollatorOptions::new()) {
            Ok(collator) => Self {
                collator: Some(collator),
            },
            Err(err) => {
                tracing::warn!("Title collation unavailable, sorting case-insensitively: {}", err);
                Self { collator: None }
            }
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl Default for TitleOrder {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts over the whole fetched list, regardless of the view query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    pub pending: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[TaskResponse], now: DateTime<Utc>) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|task| task.is_completed).count();
        let overdue = tasks.iter().filter(|task| task.is_overdue(now)).count();
        Self {
            total,
            completed,
            overdue,
            pending: total - completed,
        }
    }
}
