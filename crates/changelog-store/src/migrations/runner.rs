//! Applies embedded migrations in id order

#![allow(clippy::result_large_err)]

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::{get_migrations, Migration};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

const CREATE_SCHEMA_VERSION: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    migration_id TEXT NOT NULL UNIQUE,
    applied_at INTEGER NOT NULL,
    checksum TEXT
)";

/// Bring the database up to the latest embedded migration
///
/// # Errors
///
/// Fails if the database records a migration this build does not embed, if
/// an applied migration's checksum changed, or if a migration's SQL fails.
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute(CREATE_SCHEMA_VERSION, [])
        .map_err(from_rusqlite)?;

    let migrations = get_migrations();
    let recorded = recorded_checksums(conn)?;
    if let Some(unknown) = recorded
        .keys()
        .find(|id| !migrations.iter().any(|m| m.id == id.as_str()))
    {
        return Err(migration_error(
            unknown,
            "recorded by a newer build of the log store",
        ));
    }

    for migration in &migrations {
        let checksum = compute_checksum(migration.sql);
        match recorded.get(migration.id) {
            Some(Some(stored)) if *stored != checksum => {
                return Err(checksum_mismatch(migration.id, stored, &checksum));
            }
            Some(_) => {}
            None => run_migration(conn, migration, &checksum)?,
        }
    }
    Ok(())
}

/// Ids of the applied migrations, oldest first
///
/// # Errors
///
/// Returns a persistence error if `schema_version` cannot be read.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    conn.execute(CREATE_SCHEMA_VERSION, [])
        .map_err(from_rusqlite)?;
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(from_rusqlite)?;
    rows.map(|row| row.map_err(from_rusqlite)).collect()
}

fn recorded_checksums(conn: &Connection) -> Result<BTreeMap<String, Option<String>>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })
        .map_err(from_rusqlite)?;
    rows.map(|row| row.map_err(from_rusqlite)).collect()
}

fn run_migration(conn: &mut Connection, migration: &Migration, checksum: &str) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        params![migration.id, chrono::Utc::now().timestamp(), checksum],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id = migration.id, "applied migration");
    Ok(())
}
