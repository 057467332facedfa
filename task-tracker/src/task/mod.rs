use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::store::{Identified, Store, StoreError, next_id, timestamp};

pub mod api;

/// A tracked task. Persisted in the `items` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// Unique identifier for the task
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    /// ID of the user the task is assigned to
    #[serde(default)]
    pub assigned_to: Option<u32>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: NaiveDateTime,
}

impl Identified for Task {
    fn id(&self) -> u32 {
        self.id
    }
}

/// Fields of a task that is about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub assigned_to: Option<u32>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            completed: false,
            assigned_to: None,
        }
    }
}

/// Partial update of a task. Only fields that are `Some` are written.
///
/// `assigned_to` distinguishes an absent key (`None`) from an explicit
/// `null` (`Some(None)`), which unassigns the task.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<u32>)]
    pub assigned_to: Option<Option<u32>>,
}

impl TaskUpdate {
    fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to;
        }
        task.updated_at = timestamp();
    }
}

/// Wraps any value that is present in the input, including `null`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(u32),
    /// Represents a storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub struct TaskService<'a> {
    store: &'a Store,
}

impl TaskService<'_> {
    pub fn new(store: &Store) -> TaskService<'_> {
        TaskService { store }
    }

    /// Retrieves all tasks in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.store.read().await?.items)
    }

    /// Retrieves a task by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to retrieve.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: u32) -> Result<Task, TaskServiceError> {
        self.store
            .read()
            .await?
            .items
            .into_iter()
            .find(|task| task.id == id)
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Creates a new task with a fresh ID and both timestamps set to now.
    ///
    /// The assignee is stored as given; it is not checked against the users.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskServiceError> {
        self.store
            .mutate(|document| {
                let now = timestamp();
                let task = Task {
                    id: next_id(&document.items)?,
                    title: new_task.title,
                    description: new_task.description,
                    completed: new_task.completed,
                    assigned_to: new_task.assigned_to,
                    created_at: now,
                    updated_at: now,
                };
                document.items.push(task.clone());
                tracing::info!("Created task {}", task.id);
                Ok(task)
            })
            .await
    }

    /// Applies a partial update to a task and refreshes its `updated_at`.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `update` - The fields to overwrite.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, id: u32, update: TaskUpdate) -> Result<Task, TaskServiceError> {
        self.store
            .mutate(|document| {
                let task = document
                    .items
                    .iter_mut()
                    .find(|task| task.id == id)
                    .ok_or(TaskServiceError::TaskNotFound(id))?;
                update.apply_to(task);
                Ok(task.clone())
            })
            .await
    }

    /// Deletes a task by its ID.
    ///
    /// Comments on the task are left in place unless `cascade_comments` is
    /// set, in which case they are removed in the same write.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(
        &self,
        id: u32,
        cascade_comments: bool,
    ) -> Result<Task, TaskServiceError> {
        self.store
            .mutate(|document| {
                let position = document
                    .items
                    .iter()
                    .position(|task| task.id == id)
                    .ok_or(TaskServiceError::TaskNotFound(id))?;
                let task = document.items.remove(position);

                if cascade_comments {
                    let before = document.comments.len();
                    document.comments.retain(|comment| comment.task_id != id);
                    tracing::info!(
                        "Removed {} comment(s) of deleted task {}",
                        before - document.comments.len(),
                        id
                    );
                }
                Ok(task)
            })
            .await
    }
}
