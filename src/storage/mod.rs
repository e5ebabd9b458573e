use crate::models::{DataError, StorageData};
use std::path::Path;
use thiserror::Error;

pub mod json;
mod migrations;
pub mod sqlite;
#[cfg(test)]
pub(crate) mod test_utils;

pub use json::JsonStorage;
pub use sqlite::SqliteStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0}")]
    Data(#[from] DataError),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Which backend a data path is opened with. Chosen via `storage.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Json,
    Sqlite,
}

impl StorageKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(StorageKind::Json),
            "sqlite" => Some(StorageKind::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Json => "json",
            StorageKind::Sqlite => "sqlite",
        }
    }
}

/// The persistence boundary: one snapshot in, one snapshot out.
///
/// `save` must flush the whole snapshot durably before returning; `load`
/// must hand back records in the same order they were saved in.
pub trait Storage: Send + Sync {
    fn save(&self, data: &StorageData) -> Result<(), StorageError>;
    fn load(&self) -> Result<StorageData, StorageError>;
}

pub fn create_storage(kind: StorageKind, path: &Path) -> Result<Box<dyn Storage>, StorageError> {
    match kind {
        StorageKind::Json => Ok(Box::new(JsonStorage::new(path))),
        StorageKind::Sqlite => Ok(Box::new(SqliteStorage::open(path)?)),
    }
}
