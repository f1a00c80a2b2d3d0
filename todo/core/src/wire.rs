//! JSON shapes exchanged between the API and its clients, plus the request validator.
//!
//! Request payloads arrive as loosely typed structs (every field optional, priority and
//! due date as raw strings) so that a bad value becomes a field violation with a useful
//! message instead of an opaque deserialization failure. [`CreateTaskRequest::validate`]
//! and [`UpdateTaskRequest::validate`] run before any domain construction and report
//! every violated field at once.
use crate::task::{
    self, DESCRIPTION_MAX_LEN, Priority, TITLE_MAX_LEN, Task, TaskFields, Title,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// A task as returned by every API operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TaskResponse {
    /// Unique identifier of the task
    pub id: Uuid,
    /// Short title, never blank
    pub title: String,
    /// Optional free text
    pub description: Option<String>,
    /// One of `low`, `medium` or `high`
    #[cfg_attr(feature = "openapi", schema(example = "medium"))]
    pub priority: String,
    /// Whether the task is done
    pub is_completed: bool,
    /// When the task was created (UTC)
    pub created_at: DateTime<Utc>,
    /// When the task was last changed (UTC), null until the first update
    pub updated_at: Option<DateTime<Utc>>,
    /// Optional due date (UTC)
    pub due_date: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            priority: task.priority().as_str().to_string(),
            is_completed: task.is_completed(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
            due_date: task.due_date(),
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

impl TaskResponse {
    /// The priority as the domain enum, or `None` if the value is not recognised.
    pub fn parsed_priority(&self) -> Option<Priority> {
        self.priority.parse().ok()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        task::is_overdue(self.is_completed, self.due_date, now)
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateTaskRequest {
    /// Required, 1 to 100 characters, not only whitespace
    #[serde(default)]
    pub title: Option<String>,
    /// Up to 500 characters
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 date or date-time
    #[serde(default)]
    pub due_date: Option<String>,
    /// `low`, `medium` or `high`; defaults to `medium`
    #[serde(default)]
    pub priority: Option<String>,
    /// Defaults to false
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// Payload for replacing every field of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateTaskRequest {
    /// Required, 1 to 100 characters, not only whitespace
    #[serde(default)]
    pub title: Option<String>,
    /// Up to 500 characters
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 date or date-time
    #[serde(default)]
    pub due_date: Option<String>,
    /// `low`, `medium` or `high`; defaults to `medium`
    #[serde(default)]
    pub priority: Option<String>,
    /// Required
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
    /// Human readable description of the failure
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every field violation found in one request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_messages(.violations))]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns true if the named field has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join_messages(violations: &[FieldViolation]) -> String {
    let messages: Vec<&str> = violations.iter().map(|v| v.message.as_str()).collect();
    messages.join("; ")
}

impl CreateTaskRequest {
    /// Checks the payload and converts it into domain fields.
    pub fn validate(self) -> Result<TaskFields, ValidationErrors> {
        let mut validator = Validator::default();
        let title = validator.title(self.title);
        let description = validator.description(self.description);
        let due_date = validator.due_date(self.due_date.as_deref());
        let priority = validator.priority(self.priority.as_deref());
        let is_completed = self.is_completed.unwrap_or(false);
        validator.finish()?;
        Ok(TaskFields {
            title: title.ok_or_else(Validator::missing_title)?,
            description,
            due_date,
            priority,
            is_completed,
        })
    }
}

impl UpdateTaskRequest {
    /// Checks the payload and converts it into domain fields.
    pub fn validate(self) -> Result<TaskFields, ValidationErrors> {
        let mut validator = Validator::default();
        let title = validator.title(self.title);
        let description = validator.description(self.description);
        let due_date = validator.due_date(self.due_date.as_deref());
        let priority = validator.priority(self.priority.as_deref());
        let is_completed = validator.required_flag("isCompleted", self.is_completed);
        validator.finish()?;
        Ok(TaskFields {
            title: title.ok_or_else(Validator::missing_title)?,
            description,
            due_date,
            priority,
            is_completed,
        })
    }
}

impl From<TaskFields> for UpdateTaskRequest {
    fn from(fields: TaskFields) -> Self {
        Self {
            title: Some(fields.title.into_inner()),
            description: fields.description,
            due_date: fields.due_date.map(|due| due.to_rfc3339()),
            priority: Some(fields.priority.as_str().to_string()),
            is_completed: Some(fields.is_completed),
        }
    }
}

/// Returned when a due date is in none of the accepted formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Due date must be an ISO-8601 date or date-time")]
pub struct InvalidDueDate;

/// Parses a due date given as RFC 3339, a naive date-time (taken as UTC) or a plain date
/// (midnight UTC). Blank input means "no due date".
pub fn parse_due_date(raw: &str) -> Result<Option<DateTime<Utc>>, InvalidDueDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed = if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        with_offset.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        naive.and_utc()
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        naive.and_utc()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0).ok_or(InvalidDueDate)?.and_utc()
    } else {
        return Err(InvalidDueDate);
    };
    Ok(Some(parsed.trunc_subsecs(6)))
}

#[derive(Default)]
struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    fn title(&mut self, raw: Option<String>) -> Option<Title> {
        let raw = match raw {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                self.reject("title", "Title is required");
                return None;
            }
        };
        match Title::new(raw) {
            Ok(title) => Some(title),
            Err(_) => {
                self.reject(
                    "title",
                    format!("Title cannot exceed {TITLE_MAX_LEN} characters"),
                );
                None
            }
        }
    }

    fn description(&mut self, raw: Option<String>) -> Option<String> {
        if let Some(description) = &raw {
            if description.chars().count() > DESCRIPTION_MAX_LEN {
                self.reject(
                    "description",
                    format!("Description cannot exceed {DESCRIPTION_MAX_LEN} characters"),
                );
            }
        }
        raw
    }

    fn due_date(&mut self, raw: Option<&str>) -> Option<DateTime<Utc>> {
        match raw.map(parse_due_date) {
            None => None,
            Some(Ok(due_date)) => due_date,
            Some(Err(err)) => {
                self.reject("dueDate", err.to_string());
                None
            }
        }
    }

    fn priority(&mut self, raw: Option<&str>) -> Priority {
        match raw {
            None => Priority::default(),
            Some(raw) => raw.parse().unwrap_or_else(|err: task::TaskError| {
                self.reject("priority", err.to_string());
                Priority::default()
            }),
        }
    }

    fn required_flag(&mut self, field: &'static str, raw: Option<bool>) -> bool {
        raw.unwrap_or_else(|| {
            self.reject(field, format!("{field} is required"));
            false
        })
    }

    fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                violations: std::mem::take(&mut self.violations),
            })
        }
    }

    // Only reached if `title` returned None, which always records a violation first.
    fn missing_title() -> ValidationErrors {
        ValidationErrors {
            violations: vec![FieldViolation {
                field: "title",
                message: "Title is required".to_string(),
            }],
        }
    }
}
