use super::migrations;
use super::{Storage, StorageError};
use crate::models::{Category, StorageData, Task};
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const INIT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    is_done BOOLEAN NOT NULL DEFAULT 0,
    due_date TEXT,
    category_id TEXT,
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS current_category (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    category_id TEXT NOT NULL
);
"#;

/// SQLite-backed store. The snapshot is rewritten wholesale on every save,
/// inside one transaction, so a cascade delete and its category removal
/// always land together.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at `path`, enables foreign
    /// keys, and brings the schema up to the latest migration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)
            .map_err(|e| StorageError::Storage(format!("failed to open database: {}", e)))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        migrations::apply_migrations(&mut conn)?;

        info!("sqlite store ready at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Storage(format!("failed to lock connection: {}", e)))
    }
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(INIT_SCHEMA)?;

    let versions: i64 = conn.query_row("SELECT COUNT(*) FROM schema_version", [], |row| {
        row.get(0)
    })?;
    if versions == 0 {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migrations::INITIAL_VERSION],
        )?;
    }
    Ok(())
}

impl Storage for SqliteStorage {
    fn save(&self, data: &StorageData) -> Result<(), StorageError> {
        data.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Whole-snapshot rewrite; tasks go first so the category foreign key
        // never dangles mid-transaction.
        tx.execute("DELETE FROM tasks", [])?;
        tx.execute("DELETE FROM categories", [])?;
        tx.execute("DELETE FROM current_category", [])?;

        for category in &data.categories {
            tx.execute(
                "INSERT INTO categories (id, name) VALUES (?1, ?2)",
                params![category.id.to_string(), category.name],
            )?;
        }

        for task in &data.tasks {
            tx.execute(
                "INSERT INTO tasks (id, title, is_done, due_date, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    task.id.to_string(),
                    task.title,
                    task.is_done,
                    task.due_date.map(|dt| dt.to_rfc3339()),
                    task.category_id.map(|id| id.to_string()),
                ],
            )?;
        }

        if let Some(current) = data.current_category {
            tx.execute(
                "INSERT INTO current_category (id, category_id) VALUES (1, ?1)",
                params![current.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> Result<StorageData, StorageError> {
        let conn = self.lock()?;

        let data = StorageData {
            categories: load_categories(&conn)?,
            tasks: load_tasks(&conn)?,
            current_category: load_current_category(&conn)?,
            ..StorageData::new()
        };
        data.validate()?;
        Ok(data)
    }
}

// Rows come back ordered by rowid: each save reinserts the whole snapshot,
// so rowid order is insertion order.
fn load_categories(conn: &Connection) -> Result<Vec<Category>, StorageError> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY rowid")?;
    let mut rows = stmt.query([])?;

    let mut categories = Vec::new();
    while let Some(row) = rows.next()? {
        categories.push(parse_category_row(row)?);
    }
    Ok(categories)
}

fn load_tasks(conn: &Connection) -> Result<Vec<Task>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT id, title, is_done, due_date, category_id FROM tasks ORDER BY rowid")?;
    let mut rows = stmt.query([])?;

    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn load_current_category(conn: &Connection) -> Result<Option<Uuid>, StorageError> {
    let mut stmt = conn.prepare("SELECT category_id FROM current_category WHERE id = 1")?;
    let mut rows = stmt.query([])?;

    match rows.next()? {
        Some(row) => {
            let id: String = row.get(0)?;
            Ok(Some(parse_uuid(&id, "current_category.category_id")?))
        }
        None => Ok(None),
    }
}

fn parse_category_row(row: &Row<'_>) -> Result<Category, StorageError> {
    let id: String = row.get(0)?;
    Ok(Category {
        id: parse_uuid(&id, "categories.id")?,
        name: row.get(1)?,
    })
}

fn parse_task_row(row: &Row<'_>) -> Result<Task, StorageError> {
    let id: String = row.get(0)?;
    let due_date: Option<String> = row.get(3)?;
    let category_id: Option<String> = row.get(4)?;

    Ok(Task {
        id: parse_uuid(&id, "tasks.id")?,
        title: row.get(1)?,
        is_done: row.get(2)?,
        due_date: due_date.as_deref().map(parse_timestamp).transpose()?,
        category_id: category_id
            .as_deref()
            .map(|value| parse_uuid(value, "tasks.category_id"))
            .transpose()?,
    })
}

fn parse_uuid(value: &str, column: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(value)
        .map_err(|_| StorageError::InvalidData(format!("bad uuid `{}` in {}", value, column)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("bad timestamp `{}`: {}", value, e)))
}
