use crate::models::{Category, StorageData, Task};
use crate::storage::json::JsonStorage;
use crate::storage::{Storage, StorageError};
use tempfile::TempDir;

/// A JSON-backed storage rooted in a fresh temp directory. The directory
/// guard must stay alive for as long as the storage is used.
pub fn temp_json_storage() -> (JsonStorage, TempDir) {
    let temp_dir = tempfile::Builder::new()
        .prefix("catodo_test")
        .tempdir()
        .expect("Failed to create temp directory");
    let storage = JsonStorage::new(temp_dir.path().join("data.json"));
    (storage, temp_dir)
}

/// Builds a snapshot with one category per name, each holding `tasks_each`
/// tasks titled "<name> task <n>".
pub fn seeded_data(names: &[&str], tasks_each: usize) -> StorageData {
    let mut data = StorageData::new();
    for name in names {
        let category = Category::new(*name);
        for n in 1..=tasks_each {
            data.tasks
                .push(Task::new(format!("{} task {}", name, n), Some(category.id), None));
        }
        data.categories.push(category);
    }
    data
}

/// Storage double whose saves always fail. Loads hand back a fixed snapshot.
pub struct FailingStorage {
    data: StorageData,
}

impl FailingStorage {
    pub fn new(data: StorageData) -> Self {
        Self { data }
    }
}

impl Storage for FailingStorage {
    fn save(&self, _data: &StorageData) -> Result<(), StorageError> {
        Err(StorageError::Storage("save refused by test double".to_string()))
    }

    fn load(&self) -> Result<StorageData, StorageError> {
        Ok(self.data.clone())
    }
}
