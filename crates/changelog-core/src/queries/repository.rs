#![allow(clippy::result_large_err)]

use crate::errors::ExError;
use crate::model::{LogEntry, NormalizedPk};
use crate::queries::criteria::LogCriteria;

/// Persistence of log entries
///
/// Entries are append-only: there is no update or delete.
pub trait ChangeLogRepository {
    /// Persist a new entry and mark it persisted with the assigned id
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPersisted` if the entry already has an id,
    /// `MissingPrimaryKey` if it has no target key, or a persistence error.
    fn append(&mut self, entry: &mut LogEntry) -> Result<i64, ExError>;

    /// Entries of one object matching `criteria`
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the query fails.
    fn change_log_for(
        &self,
        class_name: &str,
        pk: &NormalizedPk,
        criteria: &LogCriteria,
    ) -> Result<Vec<LogEntry>, ExError>;

    /// Most recent entry of one object: latest creation time, then highest id
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the query fails.
    fn latest_for(&self, class_name: &str, pk: &NormalizedPk) -> Result<Option<LogEntry>, ExError>;

    /// # Errors
    ///
    /// Returns a persistence error if the query fails.
    fn entry_by_id(&self, id: i64) -> Result<Option<LogEntry>, ExError>;
}
