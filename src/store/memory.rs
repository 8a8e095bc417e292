//! In-memory task store.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use uuid::Uuid;

use crate::store::item::TaskItem;

/// Errors returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No task with the requested id.
    #[error("task {0} not found")]
    NotFound(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe, insertion-ordered collection of tasks.
///
/// Every method takes the lock exactly once, so mutations are atomic with
/// respect to `list` and `get`. The lock is never held beyond a method call.
#[derive(Debug, Default)]
pub struct TaskStore {
    items: RwLock<Vec<TaskItem>>,
}

impl TaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the sample item the service starts with.
    pub fn with_sample() -> Self {
        Self {
            items: RwLock::new(vec![TaskItem {
                id: "1".to_string(),
                title: "Learn OpenTelemetry".to_string(),
                completed: false,
            }]),
        }
    }

    /// Snapshot of all tasks in insertion order.
    pub fn list(&self) -> Vec<TaskItem> {
        self.read().clone()
    }

    /// Look up a task by id.
    pub fn get(&self, id: &str) -> StoreResult<TaskItem> {
        self.read()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Append a new task with a fresh id and `completed = false`.
    pub fn insert(&self, title: impl Into<String>) -> TaskItem {
        let item = TaskItem {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        };
        self.write().push(item.clone());
        item
    }

    /// Overwrite both mutable fields of an existing task.
    pub fn update(&self, id: &str, title: impl Into<String>, completed: bool) -> StoreResult<TaskItem> {
        let mut items = self.write();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        item.title = title.into();
        item.completed = completed;
        Ok(item.clone())
    }

    /// Remove a task.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let mut items = self.write();
        let position = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        items.remove(position);
        Ok(())
    }

    /// Number of stored tasks.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the Vec half-mutated, so a
    // poisoned lock is safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, Vec<TaskItem>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<TaskItem>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}
