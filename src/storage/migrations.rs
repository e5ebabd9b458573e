//! Schema migrations for the SQLite backend.
//!
//! Migrations are registered in `MIGRATIONS` in strictly increasing version
//! order and applied inside a single transaction. The applied version is
//! tracked in the `schema_version` table, which `SqliteStorage::open` seeds
//! at [`INITIAL_VERSION`] when the database is fresh.
//!
//! To change the schema, append a `Migration` with the next version number
//! and both an `up` and a `down` statement batch, for example:
//!
//! ```text
//! Migration {
//!     version: 2,
//!     up: "ALTER TABLE tasks ADD COLUMN note TEXT;",
//!     down: "ALTER TABLE tasks DROP COLUMN note;",
//! }
//! ```

use super::StorageError;
use rusqlite::{Connection, Transaction};

/// Version written to `schema_version` when the initial schema is created.
pub const INITIAL_VERSION: i32 = 1;

/// A single schema change with its reversal.
#[derive(Debug)]
pub struct Migration {
    pub version: i32,
    pub up: &'static str,
    pub down: &'static str,
}

/// All migrations beyond the initial schema, in order of application.
pub const MIGRATIONS: &[Migration] = &[
    // Future schema changes land here.
];

pub fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version: i32 = conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .map_err(|e| StorageError::Storage(format!("failed to read schema version: {}", e)))?;
    Ok(version)
}

/// Applies every migration newer than the database's recorded version.
///
/// All pending migrations run inside one transaction; the recorded version
/// moves forward only when the whole batch commits.
pub fn apply_migrations(conn: &mut Connection) -> Result<(), StorageError> {
    let current_version = get_current_version(conn)?;
    let latest_version = MIGRATIONS
        .last()
        .map(|m| m.version)
        .unwrap_or(INITIAL_VERSION);

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
            apply_migration(&tx, migration)?;
        }
        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(tx: &Transaction, migration: &Migration) -> Result<(), StorageError> {
    tx.execute_batch(migration.up).map_err(|e| {
        StorageError::Storage(format!(
            "failed to apply migration {}: {}",
            migration.version, e
        ))
    })?;

    tx.execute(
        "UPDATE schema_version SET version = ?1",
        [migration.version],
    )?;
    Ok(())
}

/// Reverses migrations down to `target_version`, newest first.
#[allow(dead_code)]
pub fn rollback_migrations(conn: &mut Connection, target_version: i32) -> Result<(), StorageError> {
    let current_version = get_current_version(conn)?;
    if current_version <= target_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > target_version && m.version <= current_version)
        .rev()
    {
        rollback_migration(&tx, migration)?;
    }
    tx.execute(
        "UPDATE schema_version SET version = ?1",
        [target_version.max(INITIAL_VERSION)],
    )?;
    tx.commit()?;

    Ok(())
}

#[allow(dead_code)]
fn rollback_migration(tx: &Transaction, migration: &Migration) -> Result<(), StorageError> {
    tx.execute_batch(migration.down).map_err(|e| {
        StorageError::Storage(format!(
            "failed to roll back migration {}: {}",
            migration.version, e
        ))
    })?;
    Ok(())
}
