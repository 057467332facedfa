use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::{Identified, Store, StoreError, next_id, timestamp};

pub mod api;

pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// A comment left on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    /// Unique identifier for the comment
    pub id: u32,
    /// ID of the task the comment belongs to
    pub task_id: u32,
    pub text: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
}

impl Identified for Comment {
    fn id(&self) -> u32 {
        self.id
    }
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

/// Error type for CommentService operations.
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Represents a comment targeting a task that does not exist.
    #[error("Task with ID {0} not found")]
    TaskNotFound(u32),
    /// Represents a comment not found error.
    #[error("Comment with ID {0} not found")]
    CommentNotFound(u32),
    /// Represents a storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub struct CommentService<'a> {
    store: &'a Store,
}

impl CommentService<'_> {
    pub fn new(store: &Store) -> CommentService<'_> {
        CommentService { store }
    }

    /// Retrieves the comments of a task in insertion order.
    ///
    /// The task itself does not have to exist; comments left behind by a
    /// deleted task are still returned.
    #[tracing::instrument(skip(self))]
    pub async fn get_comments_for_task(
        &self,
        task_id: u32,
    ) -> Result<Vec<Comment>, CommentServiceError> {
        Ok(self
            .store
            .read()
            .await?
            .comments
            .into_iter()
            .filter(|comment| comment.task_id == task_id)
            .collect())
    }

    /// Creates a comment on an existing task.
    ///
    /// # Arguments
    ///
    /// * `task_id` - The ID of the task being commented on.
    /// * `text` - The comment text.
    /// * `author` - The author; `None` falls back to "Anonymous".
    #[tracing::instrument(skip(self, text))]
    pub async fn create_comment(
        &self,
        task_id: u32,
        text: String,
        author: Option<String>,
    ) -> Result<Comment, CommentServiceError> {
        self.store
            .mutate(|document| {
                if !document.items.iter().any(|task| task.id == task_id) {
                    return Err(CommentServiceError::TaskNotFound(task_id));
                }

                let comment = Comment {
                    id: next_id(&document.comments)?,
                    task_id,
                    text,
                    author: author.unwrap_or_else(default_author),
                    created_at: timestamp(),
                };
                document.comments.push(comment.clone());
                tracing::info!("Created comment {} on task {}", comment.id, task_id);
                Ok(comment)
            })
            .await
    }

    /// Deletes a comment by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Comment` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_comment(&self, id: u32) -> Result<Comment, CommentServiceError> {
        self.store
            .mutate(|document| {
                let position = document
                    .comments
                    .iter()
                    .position(|comment| comment.id == id)
                    .ok_or(CommentServiceError::CommentNotFound(id))?;
                Ok(document.comments.remove(position))
            })
            .await
    }
}
