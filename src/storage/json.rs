use super::{Storage, StorageError};
use crate::models::StorageData;
use log::debug;
use std::path::{Path, PathBuf};

/// File-backed JSON store: one pretty-printed document per data file.
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Storage for JsonStorage {
    fn save(&self, data: &StorageData) -> Result<(), StorageError> {
        data.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)?;

        // Read back and compare record counts to catch a torn write.
        let contents = std::fs::read_to_string(&self.path)?;
        let written: StorageData = serde_json::from_str(&contents)?;
        if written.tasks.len() != data.tasks.len()
            || written.categories.len() != data.categories.len()
        {
            return Err(StorageError::Storage(
                "integrity check failed after write".to_string(),
            ));
        }

        Ok(())
    }

    fn load(&self) -> Result<StorageData, StorageError> {
        if !self.path.exists() {
            debug!("no data file at {}, starting empty", self.path.display());
            return Ok(StorageData::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(StorageData::new());
        }

        let data: StorageData = serde_json::from_str(&contents)?;
        data.validate()?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Task};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_missing_file_loads_as_empty_snapshot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(temp_dir.path().join("absent.json"));

        let data = storage.load().unwrap();
        assert!(data.categories.is_empty());
        assert!(data.tasks.is_empty());
        assert_eq!(data.current_category, None);
    }

    #[test]
    fn test_save_creates_missing_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(temp_dir.path().join("nested/dir/data.json"));

        storage.save(&StorageData::new()).unwrap();
        assert!(temp_dir.path().join("nested/dir/data.json").exists());
    }

    #[test]
    fn test_snapshot_round_trips_with_order_and_context() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(temp_dir.path().join("data.json"));

        let mut data = StorageData::new();
        for name in ["Home", "Work", "Errands"] {
            data.categories.push(Category::new(name));
        }
        let home = data.categories[0].id;
        data.tasks.push(Task::new("first", Some(home), Some(Utc::now())));
        data.tasks.push(Task::new("second", Some(home), None));
        data.current_category = Some(home);

        storage.save(&data).unwrap();
        let loaded = storage.load().unwrap();

        let names: Vec<&str> = loaded.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Home", "Work", "Errands"]);
        let titles: Vec<&str> = loaded.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(loaded.current_category, Some(home));
        assert_eq!(loaded.tasks[0].due_date, data.tasks[0].due_date);
    }

    #[test]
    fn test_save_rejects_dangling_category_reference() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(temp_dir.path().join("data.json"));

        let mut data = StorageData::new();
        data.tasks.push(Task::new("orphan", Some(Uuid::new_v4()), None));

        assert!(matches!(
            storage.save(&data),
            Err(StorageError::Data(_))
        ));
        assert!(!temp_dir.path().join("data.json").exists());
    }

    #[test]
    fn test_empty_file_loads_as_empty_snapshot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data.json");
        std::fs::write(&path, "  \n").unwrap();

        let storage = JsonStorage::new(&path);
        let data = storage.load().unwrap();
        assert!(data.categories.is_empty());
    }
}
