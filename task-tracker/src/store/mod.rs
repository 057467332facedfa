use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::comment::Comment;
use crate::task::Task;
use crate::user::User;

pub mod file;

pub use file::JsonFileStorage;

/// The whole persisted state: every collection, in insertion order.
///
/// Keys missing from a persisted document are backfilled with empty
/// collections when it is loaded.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub items: Vec<Task>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Anything stored in a [`Document`] collection.
pub trait Identified {
    fn id(&self) -> u32;
}

/// Returns the id the next entity of a collection receives.
///
/// Ids grow from the largest one still present, so an id freed by a delete is
/// only handed out again once every larger id is gone as well.
pub fn next_id<T: Identified>(collection: &[T]) -> Result<u32, StoreError> {
    collection
        .iter()
        .map(Identified::id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(StoreError::IdSpaceExhausted)
}

/// Timestamp written into `created_at` / `updated_at`.
pub fn timestamp() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Error type for Store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Represents a failure to write the data file.
    #[error("Failed to write data file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Represents a failure to serialize the document.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Represents a collection whose largest id is already `u32::MAX`.
    #[error("No ids left to allocate")]
    IdSpaceExhausted,
    /// Represents a storage call that did not run to completion.
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Backing storage for the [`Document`].
#[cfg_attr(test, mockall::automock)]
pub trait DocumentStorage: Send + Sync {
    /// Reads the persisted document. Missing or unreadable data yields an
    /// empty document instead of an error.
    fn load(&self) -> Document;

    /// Replaces the persisted document with `document`.
    fn persist(&self, document: &Document) -> Result<(), StoreError>;

    /// Creates an empty persisted document unless one already exists.
    fn initialize(&self) -> Result<(), StoreError>;
}

/// Owns the document storage and serializes every read-modify-write cycle.
///
/// Storage calls run on the blocking thread pool.
pub struct Store {
    storage: Arc<dyn DocumentStorage>,
    lock: tokio::sync::Mutex<()>,
}

impl Store {
    pub fn new(storage: impl DocumentStorage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Creates a store backed by the JSON file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(JsonFileStorage::new(path.as_ref()))
    }

    /// Makes sure the backing storage exists. Safe to call repeatedly.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&self) -> Result<(), StoreError> {
        self.storage.initialize()
    }

    /// Loads a snapshot of the current document.
    pub async fn read(&self) -> Result<Document, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Runs `mutation` against a freshly loaded document and persists the
    /// result.
    ///
    /// Nothing is written when `mutation` returns an error. The lock is
    /// held from load to persist, so concurrent mutations never overwrite each
    /// other.
    pub async fn mutate<T, E, F>(&self, mutation: F) -> Result<T, E>
    where
        F: FnOnce(&mut Document) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let output = mutation(&mut document)?;
        self.persist(document).await?;
        Ok(output)
    }

    async fn load(&self) -> Result<Document, StoreError> {
        let storage = Arc::clone(&self.storage);
        Ok(tokio::task::spawn_blocking(move || storage.load()).await?)
    }

    async fn persist(&self, document: Document) -> Result<(), StoreError> {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || storage.persist(&document)).await?
    }
}
