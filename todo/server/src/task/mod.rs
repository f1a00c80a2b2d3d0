use crate::entities::task;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use todo_core::{Task, TaskError, TaskFields, Title};
use uuid::Uuid;

pub mod api;

/// Error type for TaskRepository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The nil UUID was passed where a task identifier is required.
    #[error("ID cannot be empty")]
    EmptyId,
    /// No stored task has the given identifier.
    #[error("Todo with ID {0} not found")]
    NotFound(Uuid),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// A stored row no longer satisfies the task invariants.
    #[error("Stored task {id} is invalid: {source}")]
    Corrupt {
        id: Uuid,
        #[source]
        source: TaskError,
    },
}

/// Persistence operations for tasks.
///
/// Each method is a single atomic interaction with the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns every task, newest first.
    async fn list_all(&self) -> Result<Vec<Task>, RepositoryError>;

    /// Returns the task with the given id, or `None` if there is none.
    ///
    /// Fails with [`RepositoryError::EmptyId`] for the nil UUID.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Task>, RepositoryError>;

    /// Stores a new task.
    async fn add(&self, task: &Task) -> Result<(), RepositoryError>;

    /// Overwrites every column of the stored task with the same id.
    ///
    /// Fails with [`RepositoryError::NotFound`] if no such row exists.
    async fn update(&self, task: &Task) -> Result<(), RepositoryError>;

    /// Removes the task if it exists. Deleting an unknown id is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// [`TaskRepository`] backed by a sea-orm connection pool.
///
/// Every call checks a connection out of the pool and hands it back when the call returns,
/// on success and on error alike. No connection is held between calls.
#[derive(Clone, Debug)]
pub struct SeaOrmTaskRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTaskRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<task::Model> for Task {
    type Error = RepositoryError;

    fn try_from(model: task::Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let corrupt = |source: TaskError| RepositoryError::Corrupt { id, source };
        let fields = TaskFields {
            title: Title::new(model.title).map_err(corrupt)?,
            description: model.description,
            due_date: model.due_date,
            priority: model.priority.into(),
            is_completed: model.is_completed,
        };
        Task::restore(id, fields, model.created_at, model.updated_at).map_err(corrupt)
    }
}

fn active_model(task: &Task) -> task::ActiveModel {
    task::ActiveModel {
        id: ActiveValue::Set(task.id()),
        title: ActiveValue::Set(task.title().to_string()),
        description: ActiveValue::Set(task.description().map(str::to_string)),
        priority: ActiveValue::Set(task.priority().into()),
        is_completed: ActiveValue::Set(task.is_completed()),
        created_at: ActiveValue::Set(task.created_at()),
        updated_at: ActiveValue::Set(task.updated_at()),
        due_date: ActiveValue::Set(task.due_date()),
    }
}

#[async_trait]
impl TaskRepository for SeaOrmTaskRepository {
    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Task>, RepositoryError> {
        task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Task::try_from)
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Task>, RepositoryError> {
        if id.is_nil() {
            return Err(RepositoryError::EmptyId);
        }
        task::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Task::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self, task), fields(id = %task.id()))]
    async fn add(&self, task: &Task) -> Result<(), RepositoryError> {
        task::Entity::insert(active_model(task))
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task), fields(id = %task.id()))]
    async fn update(&self, task: &Task) -> Result<(), RepositoryError> {
        let result = task::Entity::update_many()
            .set(active_model(task))
            .filter(task::Column::Id.eq(task.id()))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(task.id()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = task::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            tracing::debug!("No task with ID {} to delete", id);
        }
        Ok(())
    }
}
