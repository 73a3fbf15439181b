//! Session storage collaborators.
//!
//! The core never talks to the network itself. Loading and saving go through
//! a [`SessionBackend`], which moves whole JSON documents keyed by task.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::state::SessionError;

/// Identifies one annotation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub task_index: usize,
    pub project_name: String,
}

impl TaskKey {
    pub fn new(task_index: usize, project_name: impl Into<String>) -> Self {
        Self {
            task_index,
            project_name: project_name.into(),
        }
    }
}

/// Trait for session storage implementations.
pub trait SessionBackend: Send + Sync {
    /// Fetch the full session document for a task. Blocks until the whole
    /// document is available.
    fn load(&self, key: &TaskKey) -> Result<String, SessionError>;

    /// Store a full session document for a task.
    fn save(&self, key: &TaskKey, document: &str) -> Result<(), SessionError>;
}

/// Stores each task as `<root>/<project>/task-<index>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding a task.
    pub fn task_path(&self, key: &TaskKey) -> Result<PathBuf, SessionError> {
        let name = key.project_name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid project name '{}'", name),
            )));
        }
        Ok(self
            .root
            .join(name)
            .join(format!("task-{:04}.json", key.task_index)))
    }
}

impl SessionBackend for FileBackend {
    fn load(&self, key: &TaskKey) -> Result<String, SessionError> {
        let path = self.task_path(key)?;
        log::debug!("Reading session from {:?}", path);
        Ok(std::fs::read_to_string(path)?)
    }

    fn save(&self, key: &TaskKey, document: &str) -> Result<(), SessionError> {
        let path = self.task_path(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, document)?;
        log::debug!("Wrote session to {:?}", path);
        Ok(())
    }
}

/// Keeps documents in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: Mutex<HashMap<TaskKey, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document directly.
    pub fn insert(&self, key: TaskKey, document: impl Into<String>) {
        if let Ok(mut docs) = self.documents.lock() {
            docs.insert(key, document.into());
        }
    }

    /// Stored document for a task, if any.
    pub fn get(&self, key: &TaskKey) -> Option<String> {
        self.documents.lock().ok()?.get(key).cloned()
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self, key: &TaskKey) -> Result<String, SessionError> {
        self.get(key).ok_or_else(|| {
            SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no task {} in project '{}'", key.task_index, key.project_name),
            ))
        })
    }

    fn save(&self, key: &TaskKey, document: &str) -> Result<(), SessionError> {
        self.insert(key.clone(), document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("satcore-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_task_path_layout() {
        let backend = FileBackend::new("/data");
        let path = backend.task_path(&TaskKey::new(7, "cars")).unwrap();
        assert_eq!(path, PathBuf::from("/data/cars/task-0007.json"));
    }

    #[test]
    fn test_task_path_rejects_traversal() {
        let backend = FileBackend::new("/data");
        assert!(backend.task_path(&TaskKey::new(0, "../etc")).is_err());
        assert!(backend.task_path(&TaskKey::new(0, "")).is_err());
    }

    #[test]
    fn test_file_backend_round_trip() {
        let root = temp_root("file-backend");
        let backend = FileBackend::new(&root);
        let key = TaskKey::new(1, "demo");

        backend.save(&key, "{\"items\": []}").unwrap();
        assert_eq!(backend.load(&key).unwrap(), "{\"items\": []}");

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_file_backend_missing_task() {
        let backend = FileBackend::new(temp_root("missing"));
        let result = backend.load(&TaskKey::new(0, "none"));
        assert!(matches!(result, Err(SessionError::Io(_))));
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        let key = TaskKey::new(0, "p");
        assert!(backend.load(&key).is_err());
        backend.save(&key, "doc").unwrap();
        assert_eq!(backend.load(&key).unwrap(), "doc");
    }
}
