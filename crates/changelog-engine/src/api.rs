//! Retrieval API and custom messages.
//!
//! Reads are best effort: a record without a key has no history, and
//! entries whose operation code this build does not know are skipped with a
//! warning instead of failing the whole listing.

#![allow(clippy::result_large_err)]

use crate::behavior::ChangeLogBehavior;
use crate::session::ChangeLogSession;
use changelog_core::errors::{ChangeLogError, ExError};
use changelog_core::queries::{related_change_log, RelatedChangeLog};
use changelog_core::{
    log_op_end, log_op_error, log_op_start, ChangeLogAdapter, ChangeLogRepository, ChangePayload,
    LogCriteria, LogEntry, NormalizedPk, ObjectStore, PrimaryKey, Record,
};
use changelog_store::errors::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Related histories as adapters, grouped like [`RelatedChangeLog`]
pub type RelatedAdapters = RelatedChangeLog<ChangeLogAdapter>;

/// Text of a custom message
///
/// Strings, numbers and booleans are accepted; `false` becomes the empty
/// message.
///
/// # Errors
///
/// Returns `NonScalarMessage` for null, arrays and objects.
pub fn message_text(message: &Value) -> changelog_core::Result<String> {
    let value_type = match message {
        Value::String(text) => return Ok(text.clone()),
        Value::Number(n) => return Ok(n.to_string()),
        Value::Bool(b) => return Ok(if *b { "1".to_string() } else { String::new() }),
        Value::Null => "null",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Err(ChangeLogError::NonScalarMessage {
        value_type: value_type.to_string(),
    })
}

impl<R: ChangeLogRepository> ChangeLogBehavior<R> {
    /// Wrap entries in adapters, dropping the ones no adapter exists for
    pub fn adapters(&self, entries: Vec<LogEntry>) -> Vec<ChangeLogAdapter> {
        entries
            .into_iter()
            .filter_map(
                |entry| match ChangeLogAdapter::from_entry(entry, self.render_env().clone()) {
                    Ok(adapter) => Some(adapter),
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping log entry");
                        None
                    }
                },
            )
            .collect()
    }

    /// History of a record
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` for an unregistered class, or the
    /// repository's error.
    pub fn get_change_log(
        &self,
        record: &Record,
        criteria: &LogCriteria,
    ) -> Result<Vec<ChangeLogAdapter>> {
        log_op_start!("get_change_log", class_name = record.class_name());
        let start = std::time::Instant::now();

        let result = self
            .normalized_pk(record)
            .and_then(|pk| match pk {
                Some(pk) => self.repo().change_log_for(record.class_name(), &pk, criteria),
                None => Ok(Vec::new()),
            })
            .map_err(|e| {
                log_op_error!(
                    "get_change_log",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        let adapters = self.adapters(result);
        log_op_end!(
            "get_change_log",
            duration_ms = start.elapsed().as_millis() as u64,
            entry_count = adapters.len()
        );
        Ok(adapters)
    }

    /// History of an object known only by class and normalized key
    ///
    /// # Errors
    ///
    /// Returns the repository's error.
    pub fn get_change_log_for(
        &self,
        class_name: &str,
        pk: &NormalizedPk,
        criteria: &LogCriteria,
    ) -> Result<Vec<ChangeLogAdapter>> {
        let entries = self.repo().change_log_for(class_name, pk, criteria)?;
        Ok(self.adapters(entries))
    }

    /// History of the objects a record points at or is associated with
    ///
    /// Referenced objects are filed by table; linked objects by table, then
    /// by display string. Only entries strictly after `from_date` are
    /// returned when it is set.
    ///
    /// # Errors
    ///
    /// Returns `CompositeKeyUnsupported` for an association lookup on a
    /// composite key, `UnknownClass`, or any store or repository error.
    pub fn get_related_change_log<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        record: &Record,
        from_date: Option<DateTime<Utc>>,
    ) -> Result<RelatedAdapters> {
        log_op_start!("get_related_change_log", class_name = record.class_name());
        let start = std::time::Instant::now();

        let mut criteria = LogCriteria::new();
        if let Some(from_date) = from_date {
            criteria = criteria.after(from_date);
        }
        let related = related_change_log(record, self.registry(), store, self.repo(), &criteria)
            .map_err(|e| {
                log_op_error!(
                    "get_related_change_log",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        let adapters: RelatedAdapters = related.map_histories(|entries| self.adapters(entries));
        log_op_end!(
            "get_related_change_log",
            duration_ms = start.elapsed().as_millis() as u64,
            entry_count = adapters.history_count()
        );
        Ok(adapters)
    }

    /// Most recent entry of a record
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` for an unregistered class, or the
    /// repository's error.
    pub fn get_latest_change_log_entry(&self, record: &Record) -> Result<Option<ChangeLogAdapter>> {
        let Some(pk) = self.normalized_pk(record)? else {
            return Ok(None);
        };
        let latest = self.repo().latest_for(record.class_name(), &pk)?;
        Ok(latest.and_then(|entry| self.adapters(vec![entry]).pop()))
    }

    /// Entry by id, for detail views
    ///
    /// # Errors
    ///
    /// Returns the repository's error.
    pub fn entry_adapter(&self, id: i64) -> Result<Option<ChangeLogAdapter>> {
        let entry = self.repo().entry_by_id(id)?;
        Ok(entry.and_then(|entry| self.adapters(vec![entry]).pop()))
    }

    /// Entries of one object created within `[from, to]`, oldest first
    ///
    /// Either bound may be left open.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unnormalizable key, or the
    /// repository's error.
    pub fn change_log_of_object(
        &self,
        class_name: &str,
        pk: &PrimaryKey,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChangeLogAdapter>> {
        let criteria = LogCriteria::new()
            .between(from, to)
            .order(changelog_core::LogOrder::Chronological);
        self.get_change_log_for(class_name, &pk.normalize()?, &criteria)
    }

    /// Log a free-text message against a record
    ///
    /// The entry is written immediately; the record itself is not touched.
    ///
    /// # Errors
    ///
    /// - `NonScalarMessage` if `message` is null, an array or an object
    /// - `MissingPrimaryKey` if the record has no key yet
    /// - the repository's error
    pub fn set_custom_change_message(
        &mut self,
        session: &ChangeLogSession,
        record: &Record,
        message: &Value,
        actor: Option<&str>,
    ) -> Result<LogEntry> {
        log_op_start!("set_custom_change_message", class_name = record.class_name());
        let start = std::time::Instant::now();

        let result = self
            .custom_message_impl(session, record, message, actor)
            .map_err(|e| {
                log_op_error!(
                    "set_custom_change_message",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "set_custom_change_message",
            duration_ms = start.elapsed().as_millis() as u64,
            entry_id = ?result.id()
        );
        Ok(result)
    }

    fn custom_message_impl(
        &mut self,
        session: &ChangeLogSession,
        record: &Record,
        message: &Value,
        actor: Option<&str>,
    ) -> std::result::Result<LogEntry, ExError> {
        let message = message_text(message)?;
        let pk = self
            .normalized_pk(record)?
            .ok_or_else(|| ChangeLogError::MissingPrimaryKey {
                class_name: record.class_name().to_string(),
            })?;
        let mut entry = LogEntry::new(
            record.class_name(),
            Some(pk),
            self.resolve_actor(session, actor),
            Utc::now(),
            &ChangePayload::CustomMessage { message },
        )?;
        self.repo_mut().append(&mut entry)?;
        Ok(entry)
    }
}
