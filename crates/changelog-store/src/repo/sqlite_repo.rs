//! SQLite repository for log entries
//!
//! Entries are only ever inserted; there is no update or delete path.

#![allow(clippy::result_large_err)]

use crate::db;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use changelog_core::errors::{ChangeLogError, ExError};
use changelog_core::{ChangeLogRepository, LogCriteria, LogEntry, LogOrder, NormalizedPk};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const SELECT_COLUMNS: &str =
    "SELECT id, operation_type, class_name, object_pk, username, created_at, changes_detail
     FROM change_log_entries";

/// SQLite-backed change log
pub struct SqliteLogRepo {
    conn: Connection,
}

impl SqliteLogRepo {
    /// Open (creating if needed) and migrate a database file
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the file cannot be opened or migrated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(db::open(path)?)
    }

    /// A migrated in-memory database
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    /// Configure and migrate an existing connection
    ///
    /// # Errors
    ///
    /// Returns a persistence error if configuration or migration fails.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of stored entries
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the count query fails.
    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM change_log_entries", [], |row| {
                row.get(0)
            })
            .map_err(from_rusqlite)
    }

    fn query_entries(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<LogEntry>> {
        let mut stmt = self.conn.prepare(sql).map_err(from_rusqlite)?;
        let entries = stmt
            .query_map(params_from_iter(params), entry_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(entries)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry::restore(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

/// SQL for a criteria query against one object's entries
fn criteria_sql(class_name: &str, pk: &NormalizedPk, criteria: &LogCriteria) -> (String, Vec<SqlValue>) {
    let mut sql = format!("{} WHERE class_name = ? AND object_pk = ?", SELECT_COLUMNS);
    let mut params = vec![
        SqlValue::Text(class_name.to_string()),
        SqlValue::Text(pk.as_str().to_string()),
    ];

    if let Some(after) = criteria.after {
        sql.push_str(" AND created_at > ?");
        params.push(SqlValue::Integer(after.timestamp_millis()));
    }
    if let Some(from) = criteria.from {
        sql.push_str(" AND created_at >= ?");
        params.push(SqlValue::Integer(from.timestamp_millis()));
    }
    if let Some(to) = criteria.to {
        sql.push_str(" AND created_at <= ?");
        params.push(SqlValue::Integer(to.timestamp_millis()));
    }
    if let Some(operation) = criteria.operation {
        sql.push_str(" AND operation_type = ?");
        params.push(SqlValue::Integer(operation.code()));
    }

    sql.push_str(match criteria.order {
        LogOrder::Persistence => " ORDER BY id ASC",
        LogOrder::Chronological => " ORDER BY created_at ASC, id ASC",
        LogOrder::ReverseChronological => " ORDER BY created_at DESC, id DESC",
    });
    if let Some(limit) = criteria.limit {
        sql.push_str(" LIMIT ?");
        params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }
    (sql, params)
}

impl ChangeLogRepository for SqliteLogRepo {
    fn append(&mut self, entry: &mut LogEntry) -> std::result::Result<i64, ExError> {
        if let Some(entry_id) = entry.id() {
            return Err(ChangeLogError::AlreadyPersisted { entry_id }.into());
        }
        let object_pk = entry
            .object_pk()
            .ok_or_else(|| ChangeLogError::MissingPrimaryKey {
                class_name: entry.class_name().to_string(),
            })?
            .as_str()
            .to_string();

        self.conn
            .execute(
                "INSERT INTO change_log_entries
                    (operation_type, class_name, object_pk, username, created_at, changes_detail)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    entry.operation_code(),
                    entry.class_name(),
                    object_pk,
                    entry.username(),
                    entry.created_at_millis(),
                    entry.changes_detail(),
                ],
            )
            .map_err(from_rusqlite)?;

        let id = self.conn.last_insert_rowid();
        entry.mark_persisted(id)?;
        tracing::debug!(entry_id = id, class_name = entry.class_name(), "appended log entry");
        Ok(id)
    }

    fn change_log_for(
        &self,
        class_name: &str,
        pk: &NormalizedPk,
        criteria: &LogCriteria,
    ) -> std::result::Result<Vec<LogEntry>, ExError> {
        let (sql, params) = criteria_sql(class_name, pk, criteria);
        self.query_entries(&sql, params)
    }

    fn latest_for(
        &self,
        class_name: &str,
        pk: &NormalizedPk,
    ) -> std::result::Result<Option<LogEntry>, ExError> {
        let criteria = LogCriteria::new()
            .order(LogOrder::ReverseChronological)
            .limit(1);
        Ok(self
            .change_log_for(class_name, pk, &criteria)?
            .into_iter()
            .next())
    }

    fn entry_by_id(&self, id: i64) -> std::result::Result<Option<LogEntry>, ExError> {
        self.conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], entry_from_row)
            .optional()
            .map_err(from_rusqlite)
    }
}

impl std::fmt::Debug for SqliteLogRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLogRepo").finish_non_exhaustive()
    }
}
