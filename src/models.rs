use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A to-do item owned by at most one category.
///
/// The category link is a plain forward key; the "tasks of a category"
/// collection is always derived by filtering, never stored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub is_done: bool,
    pub due_date: Option<DateTime<Utc>>,
    /// When set, must name an existing category. Checked by
    /// [`StorageData::validate`] at the persistence boundary, not here.
    pub category_id: Option<Uuid>,
}

impl Task {
    /// Creates a task with a fresh id and `is_done = false`.
    ///
    /// Emptiness of `title` is a screen concern; the model accepts any text.
    pub fn new(
        title: impl Into<String>,
        category_id: Option<Uuid>,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            is_done: false,
            due_date,
            category_id,
        }
    }
}

/// A named grouping of tasks.
///
/// Names carry no uniqueness constraint; only `id` is unique.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("task {task} references unknown category {category}")]
    UnknownCategory { task: Uuid, category: Uuid },
}

/// The full persisted snapshot. Vec order is insertion order for both
/// record types, and every list the screens display preserves it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageData {
    pub version: u32, // Schema version of the serialized payload
    pub categories: Vec<Category>,
    pub tasks: Vec<Task>,
    /// The category the user has opened, if any. Navigation context for the
    /// task screen; cleared when that category is deleted.
    #[serde(default)]
    pub current_category: Option<Uuid>,
}

impl StorageData {
    pub fn new() -> Self {
        Self {
            version: 1,
            categories: Vec::new(),
            tasks: Vec::new(),
            current_category: None,
        }
    }

    /// Rejects tasks whose `category_id` names a non-existent category.
    ///
    /// Both backends call this before save and after load, so a dangling
    /// reference can neither be persisted nor silently read back.
    pub fn validate(&self) -> Result<(), DataError> {
        for task in &self.tasks {
            if let Some(category_id) = task.category_id {
                if !self.category_exists(category_id) {
                    return Err(DataError::UnknownCategory {
                        task: task.id,
                        category: category_id,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn category_exists(&self, id: Uuid) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    /// Tasks belonging to `category_id`, in insertion order.
    pub fn tasks_in(&self, category_id: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| t.category_id == Some(category_id))
    }

    pub fn task_count(&self, category_id: Uuid) -> usize {
        self.tasks_in(category_id).count()
    }
}

impl Default for StorageData {
    fn default() -> Self {
        Self::new()
    }
}
