use crate::models::{StorageData, Task};
use crate::storage::{Storage, StorageError};
use chrono::Utc;
use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskScreenError {
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("no category is open, run `catodo category use <selector>` first")]
    NoCategorySelected,
    #[error("no task at position {position} (the list has {len} entries)")]
    NoSuchRow { position: usize, len: usize },
}

/// The task list view of one category. The category id is captured when the
/// screen opens and every operation stays scoped to it.
pub struct TaskScreen<'a> {
    storage: &'a dyn Storage,
    data: StorageData,
    category_id: Uuid,
    category_name: String,
}

impl<'a> TaskScreen<'a> {
    /// Opens the task view of the currently selected category. Fails when
    /// nothing is selected or the selection points at a removed category.
    pub fn open(storage: &'a dyn Storage) -> Result<Self, TaskScreenError> {
        let data = storage.load()?;
        let category_id = data
            .current_category
            .ok_or(TaskScreenError::NoCategorySelected)?;
        let category_name = data
            .categories
            .iter()
            .find(|category| category.id == category_id)
            .map(|category| category.name.clone())
            .ok_or(TaskScreenError::NoCategorySelected)?;

        Ok(Self {
            storage,
            data,
            category_id,
            category_name,
        })
    }

    /// This category's tasks in insertion order.
    pub fn list_tasks(&self) -> Vec<&Task> {
        self.data.tasks_in(self.category_id).collect()
    }

    /// Appends a task titled `title` (trimmed) with the due date stamped to
    /// the current moment. Input that trims to nothing is ignored.
    pub fn add_task(&mut self, title: &str) -> Option<&Task> {
        let title = title.trim();
        if title.is_empty() {
            debug!("ignoring task with empty title");
            return None;
        }

        self.data
            .tasks
            .push(Task::new(title, Some(self.category_id), Some(Utc::now())));
        self.flush();
        self.data.tasks.last()
    }

    /// Deletes the task at the displayed (1-based) position. Positions count
    /// within this category's list, not the full task table.
    pub fn delete_task(&mut self, position: usize) -> Result<Task, TaskScreenError> {
        let visible: Vec<Uuid> = self.list_tasks().iter().map(|task| task.id).collect();
        let len = visible.len();
        let id = position
            .checked_sub(1)
            .and_then(|index| visible.get(index).copied())
            .ok_or(TaskScreenError::NoSuchRow { position, len })?;

        let index = self
            .data
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskScreenError::NoSuchRow { position, len })?;
        let task = self.data.tasks.remove(index);

        self.flush();
        Ok(task)
    }

    /// Writes the snapshot out. A failed flush is logged and dropped; the
    /// in-memory data stays as-is.
    fn flush(&self) {
        if let Err(err) = self.storage.save(&self.data) {
            warn!("discarding failed persistence flush: {}", err);
        }
    }

    pub fn render(&self) -> String {
        let tasks = self.list_tasks();
        if tasks.is_empty() {
            return format!(
                "No tasks in {} yet. Add one with `catodo task add <title>`.\n",
                self.category_name
            );
        }

        let mut out = format!("Tasks in {}:\n", self.category_name);
        for (index, task) in tasks.iter().enumerate() {
            let marker = if task.is_done { "[x]" } else { "[ ]" };
            out.push_str(&format!("{:>3}. {} {}", index + 1, marker, task.title));
            if let Some(due) = task.due_date {
                out.push_str(&format!(" (due {})", due.format("%Y-%m-%d")));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::storage::test_utils::{seeded_data, temp_json_storage, FailingStorage};

    fn seeded_with_selection(names: &[&str], tasks_each: usize, selected: usize) -> StorageData {
        let mut data = seeded_data(names, tasks_each);
        data.current_category = Some(data.categories[selected].id);
        data
    }

    #[test]
    fn test_open_requires_a_selection() {
        let (storage, _temp_dir) = temp_json_storage();
        storage
            .save(&seeded_data(&["Work"], 1))
            .expect("Failed to seed");

        assert!(matches!(
            TaskScreen::open(&storage),
            Err(TaskScreenError::NoCategorySelected)
        ));
    }

    #[test]
    fn test_open_rejects_dangling_selection() {
        let (storage, _temp_dir) = temp_json_storage();
        let mut data = seeded_data(&["Work"], 0);
        data.current_category = Some(Uuid::new_v4());
        storage.save(&data).expect("Failed to seed");

        assert!(matches!(
            TaskScreen::open(&storage),
            Err(TaskScreenError::NoCategorySelected)
        ));
    }

    #[test]
    fn test_add_task_stamps_due_date_and_category() {
        let (storage, _temp_dir) = temp_json_storage();
        storage
            .save(&seeded_with_selection(&["Groceries"], 0, 0))
            .expect("Failed to seed");

        let mut screen = TaskScreen::open(&storage).expect("Failed to open screen");
        let before = Utc::now();
        let added = screen.add_task("Buy milk").expect("Task not added");

        assert_eq!(added.title, "Buy milk");
        assert!(!added.is_done);
        let due = added.due_date.expect("Due date not stamped");
        assert!(due >= before && due <= Utc::now());

        let on_disk = storage.load().expect("Failed to load");
        assert_eq!(on_disk.tasks.len(), 1);
        assert_eq!(on_disk.tasks[0].category_id, on_disk.current_category);
    }

    #[test]
    fn test_add_task_ignores_blank_title() {
        let (storage, _temp_dir) = temp_json_storage();
        storage
            .save(&seeded_with_selection(&["Groceries"], 0, 0))
            .expect("Failed to seed");

        let mut screen = TaskScreen::open(&storage).expect("Failed to open screen");
        assert!(screen.add_task("   ").is_none());
        assert!(screen.list_tasks().is_empty());
    }

    #[test]
    fn test_list_tasks_stays_scoped_to_the_open_category() {
        let (storage, _temp_dir) = temp_json_storage();
        let mut data = seeded_with_selection(&["Work", "Home"], 2, 0);
        // An uncategorized stray must never show up either.
        data.tasks.push(Task::new("stray", None, None));
        storage.save(&data).expect("Failed to seed");

        let screen = TaskScreen::open(&storage).expect("Failed to open screen");
        let titles: Vec<_> = screen.list_tasks().iter().map(|t| t.title.clone()).collect();
        assert_eq!(titles, vec!["Work task 1", "Work task 2"]);
    }

    #[test]
    fn test_delete_task_removes_one_row_and_keeps_order() {
        let (storage, _temp_dir) = temp_json_storage();
        storage
            .save(&seeded_with_selection(&["Work"], 3, 0))
            .expect("Failed to seed");

        let mut screen = TaskScreen::open(&storage).expect("Failed to open screen");
        let deleted = screen.delete_task(2).expect("Failed to delete");
        assert_eq!(deleted.title, "Work task 2");

        let titles: Vec<_> = screen.list_tasks().iter().map(|t| t.title.clone()).collect();
        assert_eq!(titles, vec!["Work task 1", "Work task 3"]);
    }

    #[test]
    fn test_delete_task_counts_positions_within_the_category() {
        let (storage, _temp_dir) = temp_json_storage();
        // "Home task 1" sits after Work's tasks in the table; position 1 on
        // the Home screen must still reach it.
        storage
            .save(&seeded_with_selection(&["Work", "Home"], 1, 1))
            .expect("Failed to seed");

        let mut screen = TaskScreen::open(&storage).expect("Failed to open screen");
        let deleted = screen.delete_task(1).expect("Failed to delete");
        assert_eq!(deleted.title, "Home task 1");

        let on_disk = storage.load().expect("Failed to load");
        assert_eq!(on_disk.tasks.len(), 1);
        assert_eq!(on_disk.tasks[0].title, "Work task 1");
    }

    #[test]
    fn test_delete_task_rejects_out_of_range_position() {
        let (storage, _temp_dir) = temp_json_storage();
        storage
            .save(&seeded_with_selection(&["Work"], 1, 0))
            .expect("Failed to seed");

        let mut screen = TaskScreen::open(&storage).expect("Failed to open screen");
        assert!(matches!(
            screen.delete_task(0),
            Err(TaskScreenError::NoSuchRow { position: 0, len: 1 })
        ));
        assert!(matches!(
            screen.delete_task(5),
            Err(TaskScreenError::NoSuchRow { position: 5, len: 1 })
        ));
        assert_eq!(screen.list_tasks().len(), 1);
    }

    #[test]
    fn test_failed_flush_keeps_view_ahead_of_storage() {
        let mut data = StorageData::new();
        let category = Category::new("Work");
        data.current_category = Some(category.id);
        data.categories.push(category);

        let storage = FailingStorage::new(data);
        let mut screen = TaskScreen::open(&storage).expect("Failed to open screen");

        assert!(screen.add_task("Buy milk").is_some());
        assert!(screen.render().contains("Buy milk"));
        assert!(storage.load().expect("Failed to load").tasks.is_empty());
    }

    #[test]
    fn test_render_shows_markers_and_due_dates() {
        let (storage, _temp_dir) = temp_json_storage();
        let mut data = seeded_with_selection(&["Work"], 0, 0);
        let category_id = data.categories[0].id;
        let due = "2026-08-22T09:30:00Z"
            .parse()
            .expect("Failed to parse timestamp");
        data.tasks
            .push(Task::new("Ship release", Some(category_id), Some(due)));
        let mut done = Task::new("File report", Some(category_id), None);
        done.is_done = true;
        data.tasks.push(done);
        storage.save(&data).expect("Failed to seed");

        let screen = TaskScreen::open(&storage).expect("Failed to open screen");
        let rendered = screen.render();
        assert!(rendered.starts_with("Tasks in Work:"));
        assert!(rendered.contains("1. [ ] Ship release (due 2026-08-22)"));
        assert!(rendered.contains("2. [x] File report"));
        assert!(!rendered.contains("File report (due"));
    }

    #[test]
    fn test_render_empty_list_shows_hint() {
        let (storage, _temp_dir) = temp_json_storage();
        storage
            .save(&seeded_with_selection(&["Work"], 0, 0))
            .expect("Failed to seed");

        let screen = TaskScreen::open(&storage).expect("Failed to open screen");
        assert!(screen.render().contains("No tasks in Work yet"));
    }
}
