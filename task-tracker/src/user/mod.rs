use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::{Identified, Store, StoreError, next_id, timestamp};

pub mod api;

/// A user tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier for the user
    pub id: u32,
    /// Display name, unique among users regardless of case
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
}

impl Identified for User {
    fn id(&self) -> u32 {
        self.id
    }
}

impl User {
    /// Returns true when `name` matches this user's name, ignoring case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Error type for UserService operations.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Represents a duplicate name error (names are compared case-insensitively).
    #[error("User with name '{0}' already exists")]
    DuplicateName(String),
    /// Represents a user not found error.
    #[error("User with ID {0} not found")]
    UserNotFound(u32),
    /// Represents a storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub struct UserService<'a> {
    store: &'a Store,
}

impl UserService<'_> {
    pub fn new(store: &Store) -> UserService<'_> {
        UserService { store }
    }

    /// Retrieves all users in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.store.read().await?.users)
    }

    /// Creates a new user.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the user. Must not match an existing name, ignoring case.
    /// * `email` - The email of the user.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `User` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_user(&self, name: String, email: String) -> Result<User, UserServiceError> {
        self.store
            .mutate(|document| {
                if document.users.iter().any(|user| user.has_name(&name)) {
                    return Err(UserServiceError::DuplicateName(name));
                }

                let user = User {
                    id: next_id(&document.users)?,
                    name,
                    email,
                    created_at: timestamp(),
                };
                document.users.push(user.clone());
                tracing::info!("Created user {}", user.id);
                Ok(user)
            })
            .await
    }

    /// Deletes a user by their ID and unassigns them from every task.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `User` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: u32) -> Result<User, UserServiceError> {
        self.store
            .mutate(|document| {
                let position = document
                    .users
                    .iter()
                    .position(|user| user.id == id)
                    .ok_or(UserServiceError::UserNotFound(id))?;

                let mut unassigned = 0;
                for task in document
                    .items
                    .iter_mut()
                    .filter(|task| task.assigned_to == Some(id))
                {
                    task.assigned_to = None;
                    unassigned += 1;
                }
                if unassigned > 0 {
                    tracing::info!("Unassigned user {} from {} task(s)", id, unassigned);
                }

                Ok(document.users.remove(position))
            })
            .await
    }
}
