use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Document, DocumentStorage, StoreError, timestamp};

/// Stores the [`Document`] as a pretty-printed JSON file.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the data file,
/// so a crash mid-write leaves the previous document in place. A data file
/// that cannot be parsed is renamed to `<path>.corrupt-<timestamp>` before
/// anything is written over it.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = OsString::from(self.path.as_os_str());
        file_name.push(".tmp");
        PathBuf::from(file_name)
    }

    fn corrupt_path(&self) -> PathBuf {
        let mut file_name = OsString::from(self.path.as_os_str());
        file_name.push(format!(".corrupt-{}", timestamp().format("%Y%m%d%H%M%S%6f")));
        PathBuf::from(file_name)
    }

    /// Moves the data file out of the way so its contents survive the next write.
    fn set_aside(&self) {
        let corrupt_path = self.corrupt_path();
        match fs::rename(&self.path, &corrupt_path) {
            Ok(()) => tracing::warn!(
                "Moved unreadable data file {} to {}",
                self.path.display(),
                corrupt_path.display()
            ),
            Err(err) => tracing::error!(
                "Failed to move unreadable data file {}: {}",
                self.path.display(),
                err
            ),
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentStorage for JsonFileStorage {
    fn load(&self) -> Document {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("Data file {} does not exist yet", self.path.display());
                return Document::default();
            }
            Err(err) => {
                tracing::warn!("Failed to read data file {}: {}", self.path.display(), err);
                return Document::default();
            }
        };

        if contents.trim().is_empty() {
            return Document::default();
        }

        match serde_json::from_str(&contents) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(
                    "Data file {} is not a valid document, starting empty: {}",
                    self.path.display(),
                    err
                );
                self.set_aside();
                Document::default()
            }
        }
    }

    fn persist(&self, document: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, json).map_err(|err| self.write_error(err))?;
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                tracing::warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
            }
            return Err(self.write_error(err));
        }
        Ok(())
    }

    fn initialize(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            tracing::info!("Using existing data file {}", self.path.display());
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.write_error(err))?;
            }
        }
        self.persist(&Document::default())?;
        tracing::info!("Created data file {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::timestamp;
    use crate::task::Task;
    use crate::user::User;

    fn storage_in(dir: &tempfile::TempDir) -> JsonFileStorage {
        JsonFileStorage::new(dir.path().join("data.json"))
    }

    fn set_aside_files(dir: &tempfile::TempDir) -> Vec<PathBuf> {
        fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("data.json.corrupt-"))
            })
            .collect()
    }

    #[test]
    fn can_load_empty_document_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);

        assert_eq!(storage.load(), Document::default());
        assert!(!storage.path().exists());
    }

    #[test]
    fn can_load_empty_document_when_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "").unwrap();

        assert_eq!(storage.load(), Document::default());
    }

    #[test]
    fn can_load_empty_document_when_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "{\"items\": [").unwrap();

        assert_eq!(storage.load(), Document::default());
    }

    #[test]
    fn can_set_aside_document_with_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let original = r#"{"items": [{"id": 1, "title": null}], "users": [], "comments": []}"#;
        fs::write(storage.path(), original).unwrap();

        assert_eq!(storage.load(), Document::default());
        assert!(!storage.path().exists());

        storage.persist(&Document::default()).unwrap();

        let set_aside = set_aside_files(&dir);
        assert_eq!(set_aside.len(), 1);
        assert_eq!(fs::read_to_string(&set_aside[0]).unwrap(), original);
    }

    #[test]
    fn can_leave_empty_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "  \n").unwrap();

        assert_eq!(storage.load(), Document::default());
        assert!(storage.path().exists());
        assert!(set_aside_files(&dir).is_empty());
    }

    #[test]
    fn can_remove_temp_file_when_rename_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir(storage.path()).unwrap();
        fs::write(storage.path().join("occupied"), "").unwrap();

        let result = storage.persist(&Document::default());

        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn can_backfill_missing_collections() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::write(
            storage.path(),
            r#"{"users": [{"id": 4, "name": "Alice", "email": "", "created_at": "2025-03-01T10:00:00.000001"}]}"#,
        )
        .unwrap();

        let document = storage.load();

        assert!(document.items.is_empty());
        assert!(document.comments.is_empty());
        assert_eq!(document.users.len(), 1);
        assert_eq!(document.users[0].id, 4);
    }

    #[test]
    fn can_round_trip_document_preserving_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let now = timestamp();
        let document = Document {
            items: vec![
                Task {
                    id: 2,
                    title: "Second".to_string(),
                    description: String::new(),
                    completed: true,
                    assigned_to: Some(1),
                    created_at: now,
                    updated_at: now,
                },
                Task {
                    id: 1,
                    title: "First".to_string(),
                    description: "details".to_string(),
                    completed: false,
                    assigned_to: None,
                    created_at: now,
                    updated_at: now,
                },
            ],
            users: vec![User {
                id: 1,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                created_at: now,
            }],
            comments: Vec::new(),
        };

        storage.persist(&document).unwrap();

        assert_eq!(storage.load(), document);
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn can_initialize_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join("data.json"));

        storage.initialize().unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(storage.path()).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!({"items": [], "users": [], "comments": []})
        );

        fs::write(storage.path(), r#"{"items": [], "users": [], "comments": [], "x": 1}"#).unwrap();
        storage.initialize().unwrap();
        let contents = fs::read_to_string(storage.path()).unwrap();
        assert!(contents.contains("\"x\": 1"));
    }
}
