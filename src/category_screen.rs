use crate::models::{Category, StorageData};
use crate::storage::{Storage, StorageError};
use log::{debug, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategoryScreenError {
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("no category at position {position} (the list has {len} entries)")]
    NoSuchRow { position: usize, len: usize },
    #[error("no category named \"{0}\"")]
    UnknownName(String),
    #[error("{count} categories are named \"{name}\", select by position instead")]
    AmbiguousName { name: String, count: usize },
}

/// The category list view. Holds the snapshot it was opened with and keeps
/// rendering from it even when a persistence flush fails, so the view can
/// run ahead of the file.
pub struct CategoryScreen<'a> {
    storage: &'a dyn Storage,
    data: StorageData,
}

impl<'a> CategoryScreen<'a> {
    pub fn open(storage: &'a dyn Storage) -> Result<Self, CategoryScreenError> {
        let data = storage.load()?;
        Ok(Self { storage, data })
    }

    /// Categories in insertion order.
    pub fn list_categories(&self) -> &[Category] {
        &self.data.categories
    }

    pub fn task_count(&self, category: &Category) -> usize {
        self.data.task_count(category.id)
    }

    /// Appends a category named `name` (trimmed). Input that trims to
    /// nothing is ignored.
    pub fn add_category(&mut self, name: &str) -> Option<&Category> {
        let name = name.trim();
        if name.is_empty() {
            debug!("ignoring category with empty name");
            return None;
        }

        self.data.categories.push(Category::new(name));
        self.flush();
        self.data.categories.last()
    }

    /// Deletes the category at the displayed (1-based) position, removing
    /// every task that references it in the same step.
    pub fn delete_category(&mut self, position: usize) -> Result<Category, CategoryScreenError> {
        let index = self.index_at(position)?;
        let category = self.data.categories.remove(index);

        self.data
            .tasks
            .retain(|task| task.category_id != Some(category.id));
        if self.data.current_category == Some(category.id) {
            self.data.current_category = None;
        }

        self.flush();
        Ok(category)
    }

    /// Opens a category: resolves `selector` and persists the choice so the
    /// task view knows which category it is looking at.
    pub fn select_category(&mut self, selector: &str) -> Result<Category, CategoryScreenError> {
        let index = self.resolve(selector)?;
        let category = self.data.categories[index].clone();
        self.data.current_category = Some(category.id);
        self.flush();
        Ok(category)
    }

    /// Maps a displayed position onto a vector index.
    fn index_at(&self, position: usize) -> Result<usize, CategoryScreenError> {
        let len = self.data.categories.len();
        position
            .checked_sub(1)
            .filter(|&index| index < len)
            .ok_or(CategoryScreenError::NoSuchRow { position, len })
    }

    /// A selector is a displayed position when it parses as a number,
    /// otherwise a case-insensitive category name that must be unambiguous.
    fn resolve(&self, selector: &str) -> Result<usize, CategoryScreenError> {
        if let Ok(position) = selector.parse::<usize>() {
            return self.index_at(position);
        }

        let matches: Vec<usize> = self
            .data
            .categories
            .iter()
            .enumerate()
            .filter(|(_, category)| category.name.to_lowercase() == selector.to_lowercase())
            .map(|(index, _)| index)
            .collect();

        match matches.as_slice() {
            [] => Err(CategoryScreenError::UnknownName(selector.to_string())),
            [index] => Ok(*index),
            _ => Err(CategoryScreenError::AmbiguousName {
                name: selector.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Writes the snapshot out. A failed flush is logged and dropped; the
    /// in-memory data stays as-is.
    fn flush(&self) {
        if let Err(err) = self.storage.save(&self.data) {
            warn!("discarding failed persistence flush: {}", err);
        }
    }

    pub fn render(&self) -> String {
        if self.data.categories.is_empty() {
            return String::from("No categories yet. Add one with `catodo category add <name>`.\n");
        }

        let mut out = String::from("Categories:\n");
        for (index, category) in self.list_categories().iter().enumerate() {
            let count = self.task_count(category);
            let noun = if count == 1 { "task" } else { "tasks" };
            out.push_str(&format!(
                "{:>3}. {} ({} {})\n",
                index + 1,
                category.name,
                count,
                noun
            ));
        }
        out
    }
}
