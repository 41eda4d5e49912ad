#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, ExError};
use crate::model::{LogEntry, NormalizedPk};
use crate::queries::criteria::{LogCriteria, LogOrder};
use crate::queries::repository::ChangeLogRepository;

/// Vec-backed repository for tests and embedding without a database
#[derive(Debug, Clone, Default)]
pub struct MemoryLogRepo {
    entries: Vec<LogEntry>,
}

impl MemoryLogRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in persistence order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    fn entries_of<'a>(
        &'a self,
        class_name: &'a str,
        pk: &'a NormalizedPk,
    ) -> impl Iterator<Item = &'a LogEntry> {
        self.entries
            .iter()
            .filter(move |e| e.class_name() == class_name && e.object_pk() == Some(pk))
    }
}

impl ChangeLogRepository for MemoryLogRepo {
    fn append(&mut self, entry: &mut LogEntry) -> Result<i64, ExError> {
        if let Some(entry_id) = entry.id() {
            return Err(ChangeLogError::AlreadyPersisted { entry_id }.into());
        }
        if entry.object_pk().is_none() {
            return Err(ChangeLogError::MissingPrimaryKey {
                class_name: entry.class_name().to_string(),
            }
            .into());
        }
        let id = self.entries.len() as i64 + 1;
        entry.mark_persisted(id)?;
        self.entries.push(entry.clone());
        Ok(id)
    }

    fn change_log_for(
        &self,
        class_name: &str,
        pk: &NormalizedPk,
        criteria: &LogCriteria,
    ) -> Result<Vec<LogEntry>, ExError> {
        Ok(criteria.apply(self.entries_of(class_name, pk).cloned()))
    }

    fn latest_for(&self, class_name: &str, pk: &NormalizedPk) -> Result<Option<LogEntry>, ExError> {
        let criteria = LogCriteria::new()
            .order(LogOrder::ReverseChronological)
            .limit(1);
        Ok(criteria
            .apply(self.entries_of(class_name, pk).cloned())
            .into_iter()
            .next())
    }

    fn entry_by_id(&self, id: i64) -> Result<Option<LogEntry>, ExError> {
        Ok(self.entries.iter().find(|e| e.id() == Some(id)).cloned())
    }
}
