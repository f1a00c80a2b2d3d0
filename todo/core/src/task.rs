use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of characters in a task title.
pub const TITLE_MAX_LEN: usize = 100;
/// Maximum number of characters in a task description.
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// Returns the current UTC time at microsecond precision.
///
/// Stores keep at most microseconds, so truncating here keeps a freshly built
/// task equal to the same task read back from the database.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A task is overdue when it is still open and its due date lies strictly in the past.
pub fn is_overdue(is_completed: bool, due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    !is_completed && due_date.is_some_and(|due| due < now)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Title cannot exceed 100 characters")]
    TitleTooLong,
    #[error("Description cannot exceed 500 characters")]
    DescriptionTooLong,
    #[error("Priority must be 'low', 'medium', or 'high'")]
    InvalidPriority(String),
}

/// Urgency of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Sort rank used when ordering by priority: high first, low last.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    /// Parses the exact lowercase wire value. Anything else is rejected.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(TaskError::InvalidPriority(other.to_string())),
        }
    }
}

/// A task title that is never blank and at most [`TITLE_MAX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Title(String);

impl Title {
    pub fn new(value: impl Into<String>) -> Result<Self, TaskError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if value.chars().count() > TITLE_MAX_LEN {
            return Err(TaskError::TitleTooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every caller-controlled field of a task.
///
/// Both creation and the full-replace update take a complete set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub title: Title,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub is_completed: bool,
}

impl TaskFields {
    /// Fields for a fresh, open, medium priority task.
    pub fn new(title: Title) -> Self {
        Self {
            title,
            description: None,
            due_date: None,
            priority: Priority::default(),
            is_completed: false,
        }
    }

    fn check(&self) -> Result<(), TaskError> {
        match &self.description {
            Some(description) if description.chars().count() > DESCRIPTION_MAX_LEN => {
                Err(TaskError::DescriptionTooLong)
            }
            _ => Ok(()),
        }
    }
}

/// The task entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: Uuid,
    title: Title,
    description: Option<String>,
    priority: Priority,
    is_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new task with a fresh identifier, created now.
    pub fn new(fields: TaskFields) -> Result<Self, TaskError> {
        Self::create_at(fields, now())
    }

    /// Creates a new task with a fresh identifier and the given creation time.
    pub fn create_at(fields: TaskFields, created_at: DateTime<Utc>) -> Result<Self, TaskError> {
        fields.check()?;
        Ok(Self {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            priority: fields.priority,
            is_completed: fields.is_completed,
            created_at,
            updated_at: None,
            due_date: fields.due_date,
        })
    }

    /// Rebuilds a task that already exists in the store.
    pub fn restore(
        id: Uuid,
        fields: TaskFields,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, TaskError> {
        fields.check()?;
        Ok(Self {
            id,
            title: fields.title,
            description: fields.description,
            priority: fields.priority,
            is_completed: fields.is_completed,
            created_at,
            updated_at,
            due_date: fields.due_date,
        })
    }

    /// Replaces every mutable field and stamps `updated_at`.
    pub fn update(&mut self, fields: TaskFields, now: DateTime<Utc>) -> Result<(), TaskError> {
        fields.check()?;
        self.title = fields.title;
        self.description = fields.description;
        self.due_date = fields.due_date;
        self.priority = fields.priority;
        self.is_completed = fields.is_completed;
        self.touch(now);
        Ok(())
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.is_completed = true;
        self.touch(now);
    }

    pub fn mark_pending(&mut self, now: DateTime<Utc>) {
        self.is_completed = false;
        self.touch(now);
    }

    // updated_at never moves backwards, even if the clock does.
    fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at.unwrap_or(self.created_at);
        self.updated_at = Some(now.max(floor));
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        is_overdue(self.is_completed, self.due_date, now)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the current field set, e.g. to build a full-replace update from it.
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            priority: self.priority,
            is_completed: self.is_completed,
        }
    }
}
